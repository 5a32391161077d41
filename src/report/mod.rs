//! Tabular and console renderings of a [`Report`].

use std::fmt::Write as _;

use crate::model::{CellValue, TaskRecord};
use crate::reconcile::Report;

/// Sheet holding one row per category.
pub const CATEGORY_SHEET: &str = "Category";
/// Sheet holding one row per task record.
pub const DETAIL_SHEET: &str = "CategoryDetail";

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Column charted against the first column, if any.
    pub chart_column: Option<usize>,
}

/// Represents all tables required to materialise the report workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

impl WorkbookData {
    pub fn table(&self, sheet_name: &str) -> Option<&SheetTable> {
        self.tables.iter().find(|table| table.sheet_name == sheet_name)
    }
}

/// Builds the `Category` and `CategoryDetail` tables.
pub fn build_report_workbook(report: &Report, records: &[TaskRecord]) -> WorkbookData {
    let category_rows = report
        .categories
        .iter()
        .map(|summary| {
            vec![
                CellValue::Text(summary.label.to_string()),
                count_cell(summary.total),
                count_cell(summary.returned),
                count_cell(summary.outstanding),
            ]
        })
        .collect();

    let detail_rows = records
        .iter()
        .map(|record| {
            vec![
                CellValue::Text(record.code.to_string()),
                CellValue::Text(record.sheet_name.clone()),
                CellValue::Text(record.category.label().to_string()),
                CellValue::Bool(record.returned),
                CellValue::Bool(report.is_duplicate(&record.code)),
                CellValue::Text(record.description.clone()),
            ]
        })
        .collect();

    WorkbookData {
        tables: vec![
            SheetTable {
                sheet_name: CATEGORY_SHEET.to_string(),
                columns: columns(&["category", "total", "returned", "outstanding"]),
                rows: category_rows,
                chart_column: Some(3),
            },
            SheetTable {
                sheet_name: DETAIL_SHEET.to_string(),
                columns: columns(&[
                    "code",
                    "sheet",
                    "category",
                    "returned",
                    "duplicate",
                    "description",
                ]),
                rows: detail_rows,
                chart_column: None,
            },
        ],
    }
}

/// Console summary: per-sheet and per-category counts, the outstanding
/// codes and any duplicates flagged for review.
pub fn render_summary(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Tasks: {} total, {} returned, {} outstanding",
        report.total,
        report.returned,
        report.outstanding_count()
    );

    if !report.sheets.is_empty() {
        let _ = writeln!(out, "\nBy sheet:");
        for sheet in &report.sheets {
            let _ = writeln!(
                out,
                "  {:<12} total {:>4}  returned {:>4}  outstanding {:>4}",
                sheet.sheet, sheet.total, sheet.returned, sheet.outstanding
            );
        }
    }

    let _ = writeln!(out, "\nBy category:");
    for summary in &report.categories {
        let _ = writeln!(
            out,
            "  {:<12} total {:>4}  returned {:>4}  outstanding {:>4}",
            summary.label, summary.total, summary.returned, summary.outstanding
        );
    }

    if report.outstanding.is_empty() {
        let _ = writeln!(out, "\nAll tasks have been returned.");
    } else {
        let _ = writeln!(out, "\nTasks still to be returned:");
        for record in &report.outstanding {
            let _ = writeln!(
                out,
                "  {}  [{}] {}",
                record.code, record.sheet_name, record.category
            );
        }
    }

    if !report.duplicates().is_empty() {
        let codes: Vec<String> = report.duplicates().iter().map(ToString::to_string).collect();
        let _ = writeln!(
            out,
            "\nDuplicate codes (review manually): {}",
            codes.join(", ")
        );
    }

    out
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn count_cell(count: usize) -> CellValue {
    CellValue::Number(count as f64)
}
