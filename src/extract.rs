//! Discovery of task codes in the task-definition workbook.
//!
//! The workbook has no fixed schema: every sheet named after a task group
//! (a leading digit run such as `03` or `04 补测`) is scanned row by row,
//! and the first cell holding a dashed code makes the row a task.

use tracing::{debug, info, instrument};

use crate::model::{CellValue, SheetSnapshot, TaskCode, TaskRecord, WorkbookSnapshot};

/// Returns `true` for sheets that hold a task group.
pub fn is_task_sheet(name: &str) -> bool {
    name.trim_start()
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_digit())
}

/// Extracts every task in workbook order. Records are unclassified and not
/// yet returned. Duplicate codes are kept as separate records.
#[instrument(level = "debug", skip_all, fields(sheet_count = workbook.sheets.len()))]
pub fn extract_tasks(workbook: &WorkbookSnapshot) -> Vec<TaskRecord> {
    let mut records = Vec::new();

    for sheet in &workbook.sheets {
        if !is_task_sheet(&sheet.name) {
            debug!(sheet = %sheet.name, "skipping non-task sheet");
            continue;
        }
        let before = records.len();
        extract_sheet(sheet, &mut records);
        debug!(sheet = %sheet.name, task_count = records.len() - before, "scanned task sheet");
    }

    info!(task_count = records.len(), "extracted tasks");
    records
}

fn extract_sheet(sheet: &SheetSnapshot, records: &mut Vec<TaskRecord>) {
    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let Some(code) = row.iter().find_map(code_in_cell) else {
            continue;
        };
        records.push(TaskRecord::new(
            code,
            sheet.name.clone(),
            row_idx,
            row_description(row),
        ));
    }
}

fn code_in_cell(cell: &CellValue) -> Option<TaskCode> {
    match cell {
        CellValue::Text(text) => TaskCode::find_in(text),
        _ => None,
    }
}

fn row_description(row: &[CellValue]) -> String {
    row.iter()
        .filter(|cell| matches!(cell, CellValue::Text(_)) && !cell.is_empty())
        .map(|cell| cell.to_text().trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
