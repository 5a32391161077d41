use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use task_ledger::ToolError;
use task_ledger::classify::Classifier;
use task_ledger::io::excel_read::read_workbook;
use task_ledger::model::{Category, CellValue, SheetSnapshot, TaskCode, WorkbookSnapshot};
use task_ledger::pipeline::{self, OutputKind, ReconcileOptions};
use task_ledger::reconcile::RETURNED_HEADER;
use task_ledger::report::{CATEGORY_SHEET, DETAIL_SHEET, render_summary};
use task_ledger::returned::ReturnedSet;
use tempfile::tempdir;

type Sheet<'a> = (&'a str, &'a [&'a [&'a str]]);

fn write_fixture(path: &Path, sheets: &[Sheet<'_>]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("sheet named");
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    worksheet
                        .write_string(row_idx as u32, col_idx as u16, *value)
                        .expect("cell written");
                }
            }
        }
    }
    workbook.save(path).expect("fixture saved");
}

fn task_fixture(path: &Path) {
    write_fixture(
        path,
        &[
            ("说明", &[&["03-09 示例，不计入"]]),
            (
                "03",
                &[
                    &["编号", "任务内容"],
                    &["03-01", "道路抄平"],
                    &["03-02", "核补地形"],
                    &["03-03", "道路超平 核补"],
                ],
            ),
            (
                "04",
                &[
                    &["编号", "任务内容"],
                    &["04-01", "核补地形"],
                    &["04-02", "管线调查"],
                ],
            ),
        ],
    );
}

fn returned_fixture(path: &Path, cell: &str) {
    write_fixture(path, &[("Sheet1", &[&["文件名", "编号"], &["a.dwg", cell]])]);
}

fn snapshot(sheets: &[Sheet<'_>]) -> WorkbookSnapshot {
    WorkbookSnapshot {
        sheets: sheets
            .iter()
            .map(|(name, rows)| {
                let mut sheet = SheetSnapshot::new(*name);
                for (row_idx, row) in rows.iter().enumerate() {
                    for (col_idx, value) in row.iter().enumerate() {
                        sheet.set(row_idx, col_idx, CellValue::Text(value.to_string()));
                    }
                }
                sheet
            })
            .collect(),
    }
}

fn outstanding_codes(analysis: &pipeline::Analysis) -> BTreeSet<String> {
    analysis
        .report
        .outstanding
        .iter()
        .map(|record| record.code.to_string())
        .collect()
}

#[test]
fn end_to_end_reports_outstanding_and_marks_copy() {
    let temp_dir = tempdir().expect("temporary directory");
    let tasks_path = temp_dir.path().join("tasks.xlsx");
    let returned_path = temp_dir.path().join("returned.xlsx");
    task_fixture(&tasks_path);
    returned_fixture(&returned_path, "0301 0302 0401");
    let original_bytes = fs::read(&tasks_path).expect("tasks read");

    let mut options = ReconcileOptions::new(&tasks_path, &returned_path);
    options.report = Some(temp_dir.path().join("report.xlsx"));
    options.chart = Some(temp_dir.path().join("chart.png"));
    options.json = Some(temp_dir.path().join("report.json"));

    let analysis = pipeline::analyse_files(&options).expect("analysis");
    assert_eq!(analysis.records.len(), 5);
    assert_eq!(
        outstanding_codes(&analysis),
        BTreeSet::from(["03-03".to_string(), "04-02".to_string()])
    );

    let totals: Vec<(Category, usize, usize, usize)> = analysis
        .report
        .categories
        .iter()
        .map(|c| (c.category, c.total, c.returned, c.outstanding))
        .collect();
    assert_eq!(
        totals,
        vec![
            (Category::RoadLeveling, 2, 1, 1),
            (Category::CoreSupplementTopography, 2, 2, 0),
            (Category::Uncategorized, 1, 0, 1),
        ]
    );

    let outputs = pipeline::write_outputs(&analysis, &options);
    assert!(outputs.failures.is_empty(), "{:?}", outputs.failures);
    let written: Vec<OutputKind> = outputs.written.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(
        written,
        vec![
            OutputKind::ProcessedCopy,
            OutputKind::Report,
            OutputKind::Chart,
            OutputKind::Json,
        ]
    );
    assert_eq!(fs::read(&tasks_path).expect("tasks reread"), original_bytes);

    let processed_path = temp_dir.path().join("tasks_processed.xlsx");
    assert_eq!(options.processed_path(), processed_path);
    let processed = read_workbook(&processed_path).expect("processed copy read");
    let sheet_03 = processed
        .sheets
        .iter()
        .find(|sheet| sheet.name == "03")
        .expect("sheet 03 kept");
    assert_eq!(sheet_03.rows[0][2], CellValue::Text(RETURNED_HEADER.to_string()));
    assert_eq!(sheet_03.rows[1][2], CellValue::Bool(true));
    assert_eq!(sheet_03.rows[2][2], CellValue::Bool(true));
    assert_eq!(sheet_03.rows[3][2], CellValue::Bool(false));
    assert_eq!(sheet_03.rows[1][0], CellValue::Text("03-01".to_string()));
    assert!(processed.sheets.iter().any(|sheet| sheet.name == "说明"));

    let report = read_workbook(options.report.as_deref().expect("report path"))
        .expect("report read");
    let category = report
        .sheets
        .iter()
        .find(|sheet| sheet.name == CATEGORY_SHEET)
        .expect("category sheet");
    assert_eq!(category.rows[1][0], CellValue::Text("道路抄平".to_string()));
    assert_eq!(category.rows[1][3], CellValue::Number(1.0));
    let detail = report
        .sheets
        .iter()
        .find(|sheet| sheet.name == DETAIL_SHEET)
        .expect("detail sheet");
    assert_eq!(detail.rows.len(), 6);

    let chart_bytes = fs::read(options.chart.as_deref().expect("chart path")).expect("chart read");
    assert!(chart_bytes.starts_with(b"\x89PNG"));

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(options.json.as_deref().expect("json path")).expect("json read"),
    )
    .expect("json parsed");
    assert_eq!(json["outstanding"][0]["code"], "03-03");
}

#[test]
fn missing_task_file_is_fatal_and_writes_nothing() {
    let temp_dir = tempdir().expect("temporary directory");
    let returned_path = temp_dir.path().join("returned.xlsx");
    returned_fixture(&returned_path, "0301");

    let options = ReconcileOptions::new(temp_dir.path().join("absent.xlsx"), &returned_path);
    let result = pipeline::analyse_files(&options);

    assert!(matches!(result, Err(ToolError::MissingInput(_))));
    assert!(!options.processed_path().exists());
    let entries = fs::read_dir(temp_dir.path()).expect("dir listed").count();
    assert_eq!(entries, 1);
}

#[test]
fn multi_code_cells_yield_independent_members() {
    let workbook = snapshot(&[("Sheet1", &[&["0101 0102  0105"]])]);
    let set = ReturnedSet::from_workbook(&workbook);

    for token in ["0101", "0102", "0105", "01-01", "1-5"] {
        assert!(set.contains_token(token), "{token}");
    }
    assert!(!set.contains_token("0103"));
    assert_eq!(set.len(), 3);
}

#[test]
fn garbage_cells_contribute_nothing() {
    let workbook = snapshot(&[("Sheet1", &[&["n/a", "-", "备注 见附件", "0000"]])]);
    let set = ReturnedSet::from_workbook(&workbook);
    assert!(set.is_empty());
}

#[test]
fn numeric_cells_and_whole_group_markers_count_as_returned() {
    let mut sheet = SheetSnapshot::new("Sheet1");
    sheet.set(0, 0, CellValue::Number(301.0));
    sheet.set(1, 0, CellValue::Text("04al".to_string()));
    let set = ReturnedSet::from_workbook(&WorkbookSnapshot { sheets: vec![sheet] });

    assert!(set.contains(&TaskCode::new(3, 1)));
    assert!(!set.contains(&TaskCode::new(3, 2)));
    assert!(set.contains(&TaskCode::new(4, 1)));
    assert!(set.contains(&TaskCode::new(4, 17)));
}

#[test]
fn reconciliation_is_idempotent() {
    let temp_dir = tempdir().expect("temporary directory");
    let tasks_path = temp_dir.path().join("tasks.xlsx");
    let returned_path = temp_dir.path().join("returned.xlsx");
    task_fixture(&tasks_path);
    returned_fixture(&returned_path, "0301 0302 0401");

    let options = ReconcileOptions::new(&tasks_path, &returned_path);
    let first = pipeline::analyse_files(&options).expect("first run");
    let second = pipeline::analyse_files(&options).expect("second run");

    assert_eq!(first.report, second.report);
    assert_eq!(render_summary(&first.report), render_summary(&second.report));
}

#[test]
fn duplicate_codes_are_kept_and_flagged() {
    let tasks = snapshot(&[
        ("03", &[&["03-01", "道路抄平"]]),
        ("05", &[&["03-01", "核补地形复测"], &["05-01", "道路抄平"]]),
    ]);
    let returned = snapshot(&[("Sheet1", &[&["0501"]])]);

    let analysis = pipeline::analyse(tasks, &returned, &Classifier::default());

    assert_eq!(analysis.records.len(), 3);
    assert_eq!(analysis.report.duplicates(), [TaskCode::new(3, 1)]);
    assert_eq!(analysis.report.outstanding.len(), 2);
    assert_eq!(analysis.report.sheets.len(), 2);
    assert!(render_summary(&analysis.report).contains("Duplicate codes"));
}

#[test]
fn outputs_never_overwrite_inputs() {
    let temp_dir = tempdir().expect("temporary directory");
    let tasks_path = temp_dir.path().join("tasks.xlsx");
    let returned_path = temp_dir.path().join("returned.xlsx");
    task_fixture(&tasks_path);
    returned_fixture(&returned_path, "0301");
    let original_bytes = fs::read(&tasks_path).expect("tasks read");

    let mut options = ReconcileOptions::new(&tasks_path, &returned_path);
    options.report = Some(tasks_path.clone());

    let analysis = pipeline::analyse_files(&options).expect("analysis");
    let failures = pipeline::write_outputs(&analysis, &options).failures;

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, OutputKind::Report);
    assert!(matches!(failures[0].error, ToolError::WouldOverwriteInput(_)));
    assert_eq!(fs::read(&tasks_path).expect("tasks reread"), original_bytes);
    assert!(options.processed_path().exists());
}

#[test]
fn all_returned_prints_completion_message() {
    let tasks = snapshot(&[("03", &[&["03-01 道路抄平"]])]);
    let returned = snapshot(&[("Sheet1", &[&["03AL"]])]);

    let analysis = pipeline::analyse(tasks, &returned, &Classifier::default());

    assert_eq!(analysis.report.outstanding_count(), 0);
    assert!(render_summary(&analysis.report).contains("All tasks have been returned."));
}

#[test]
fn date_cells_survive_into_processed_copy() {
    let temp_dir = tempdir().expect("temporary directory");
    let tasks_path = temp_dir.path().join("dated.xlsx");
    let returned_path = temp_dir.path().join("returned.xlsx");

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("03").expect("sheet named");
    worksheet.write_string(0, 0, "03-01").expect("code written");
    worksheet.write_string(0, 1, "道路抄平").expect("description written");
    // 2024-01-05
    worksheet
        .write_number_with_format(0, 2, 45296.0, &date_format)
        .expect("date written");
    workbook.save(&tasks_path).expect("fixture saved");
    returned_fixture(&returned_path, "0301");

    let options = ReconcileOptions::new(&tasks_path, &returned_path);
    let analysis = pipeline::analyse_files(&options).expect("analysis");
    assert_eq!(analysis.source.sheets[0].rows[0][2], CellValue::DateTime(45296.0));
    assert_eq!(analysis.records[0].description, "03-01 道路抄平");

    let outputs = pipeline::write_outputs(&analysis, &options);
    assert!(outputs.failures.is_empty(), "{:?}", outputs.failures);

    let processed = read_workbook(&options.processed_path()).expect("processed copy read");
    assert_eq!(
        processed.sheets[0].rows[0],
        vec![
            CellValue::Text("03-01".to_string()),
            CellValue::Text("道路抄平".to_string()),
            CellValue::DateTime(45296.0),
            CellValue::Bool(true),
        ]
    );
}

#[test]
fn codes_packed_with_punctuation_are_all_returned() {
    let temp_dir = tempdir().expect("temporary directory");
    let tasks_path = temp_dir.path().join("tasks.xlsx");
    let returned_path = temp_dir.path().join("returned.xlsx");
    write_fixture(
        &tasks_path,
        &[(
            "03",
            &[
                &["03-01", "道路抄平"],
                &["03-02", "道路抄平"],
                &["03-03", "核补地形"],
                &["03-04", "核补地形"],
                &["03-05", "核补地形"],
            ],
        )],
    );
    returned_fixture(&returned_path, "0301,0302、0303;0304");

    let options = ReconcileOptions::new(&tasks_path, &returned_path);
    let analysis = pipeline::analyse_files(&options).expect("analysis");

    assert_eq!(
        outstanding_codes(&analysis),
        BTreeSet::from(["03-05".to_string()])
    );
}

#[test]
fn unwritable_chart_path_leaves_other_outputs_intact() {
    let temp_dir = tempdir().expect("temporary directory");
    let tasks_path = temp_dir.path().join("tasks.xlsx");
    let returned_path = temp_dir.path().join("returned.xlsx");
    task_fixture(&tasks_path);
    returned_fixture(&returned_path, "0301 0302 0401");

    let mut options = ReconcileOptions::new(&tasks_path, &returned_path);
    let report_path = temp_dir.path().join("report.xlsx");
    let chart_path = temp_dir.path().join("missing-dir").join("chart.png");
    options.report = Some(report_path.clone());
    options.chart = Some(chart_path.clone());

    let analysis = pipeline::analyse_files(&options).expect("analysis");
    let outputs = pipeline::write_outputs(&analysis, &options);

    assert_eq!(outputs.failures.len(), 1);
    assert_eq!(outputs.failures[0].kind, OutputKind::Chart);
    assert_eq!(outputs.failures[0].path, chart_path);
    assert!(!chart_path.exists());

    assert!(options.processed_path().exists());
    assert!(report_path.exists());
    assert_eq!(
        outputs.written,
        vec![
            (OutputKind::ProcessedCopy, options.processed_path()),
            (OutputKind::Report, report_path),
        ]
    );
    assert_eq!(analysis.report.outstanding_count(), 2);
}
