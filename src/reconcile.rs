use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::model::{Category, CellValue, TaskCode, TaskRecord, WorkbookSnapshot};
use crate::returned::ReturnedSet;

/// Header written above the flag column of the processed copy.
pub const RETURNED_HEADER: &str = "returned";

/// Counts for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub label: &'static str,
    pub total: usize,
    pub returned: usize,
    pub outstanding: usize,
}

/// Counts for one task sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub sheet: String,
    pub total: usize,
    pub returned: usize,
    pub outstanding: usize,
}

/// Aggregated reconciliation result, derived entirely from the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total: usize,
    pub returned: usize,
    pub categories: Vec<CategorySummary>,
    pub sheets: Vec<SheetSummary>,
    /// Outstanding records in workbook order.
    pub outstanding: Vec<TaskRecord>,
    /// Codes found more than once in the task-definition workbook, sorted.
    duplicates: Vec<TaskCode>,
}

/// Sets the `returned` flag on every record.
#[instrument(level = "debug", skip_all, fields(task_count = records.len()))]
pub fn reconcile(records: Vec<TaskRecord>, returned: &ReturnedSet) -> Vec<TaskRecord> {
    records
        .into_iter()
        .map(|mut record| {
            record.returned = returned.contains(&record.code);
            record
        })
        .collect()
}

impl Report {
    pub fn from_records(records: &[TaskRecord]) -> Self {
        let mut categories: Vec<CategorySummary> = Category::ALL
            .iter()
            .map(|category| CategorySummary {
                category: *category,
                label: category.label(),
                total: 0,
                returned: 0,
                outstanding: 0,
            })
            .collect();

        let mut sheets: Vec<SheetSummary> = Vec::new();
        let mut sheet_positions: HashMap<&str, usize> = HashMap::new();
        let mut occurrences: BTreeMap<TaskCode, usize> = BTreeMap::new();

        for record in records {
            if let Some(summary) = categories
                .iter_mut()
                .find(|summary| summary.category == record.category)
            {
                summary.add(record.returned);
            }

            let position = *sheet_positions
                .entry(record.sheet_name.as_str())
                .or_insert_with(|| {
                    sheets.push(SheetSummary {
                        sheet: record.sheet_name.clone(),
                        total: 0,
                        returned: 0,
                        outstanding: 0,
                    });
                    sheets.len() - 1
                });
            sheets[position].add(record.returned);

            *occurrences.entry(record.code).or_default() += 1;
        }

        let duplicates: Vec<TaskCode> = occurrences
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(code, _)| code)
            .collect();
        for code in &duplicates {
            warn!(%code, "task code appears more than once; review manually");
        }

        let outstanding: Vec<TaskRecord> = records
            .iter()
            .filter(|record| !record.returned)
            .cloned()
            .collect();
        let returned = records.len() - outstanding.len();

        info!(
            total = records.len(),
            returned,
            outstanding = outstanding.len(),
            "reconciled tasks"
        );

        Report {
            total: records.len(),
            returned,
            categories,
            sheets,
            outstanding,
            duplicates,
        }
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    /// Codes occurring more than once, in ascending order.
    pub fn duplicates(&self) -> &[TaskCode] {
        &self.duplicates
    }

    pub fn is_duplicate(&self, code: &TaskCode) -> bool {
        self.duplicates.binary_search(code).is_ok()
    }
}

impl CategorySummary {
    fn add(&mut self, returned: bool) {
        self.total += 1;
        if returned {
            self.returned += 1;
        } else {
            self.outstanding += 1;
        }
    }
}

impl SheetSummary {
    fn add(&mut self, returned: bool) {
        self.total += 1;
        if returned {
            self.returned += 1;
        } else {
            self.outstanding += 1;
        }
    }
}

/// Produces a copy of the task-definition workbook with a `returned` column
/// appended to every sheet that holds tasks. The source snapshot is left
/// untouched.
pub fn mark_returned(workbook: &WorkbookSnapshot, records: &[TaskRecord]) -> WorkbookSnapshot {
    let mut marked = workbook.clone();

    for sheet in &mut marked.sheets {
        let sheet_records: Vec<&TaskRecord> = records
            .iter()
            .filter(|record| record.sheet_name == sheet.name)
            .collect();
        if sheet_records.is_empty() {
            continue;
        }

        let flag_col = sheet.width();
        if sheet_records.iter().all(|record| record.row != 0) {
            sheet.set(0, flag_col, CellValue::Text(RETURNED_HEADER.to_string()));
        }
        for record in sheet_records {
            sheet.set(record.row, flag_col, CellValue::Bool(record.returned));
        }
    }

    marked
}
