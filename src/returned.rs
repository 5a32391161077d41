use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::model::{CellValue, ReturnedToken, TaskCode, WorkbookSnapshot, parse_token, scan_tokens};

/// Codes already returned, built from every cell of the returned-tasks
/// workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReturnedSet {
    codes: BTreeSet<TaskCode>,
    whole_groups: BTreeSet<u16>,
}

impl ReturnedSet {
    /// Scans every cell of every sheet. Each whitespace-separated token may
    /// hold several codes joined by punctuation; tokens holding none are
    /// dropped silently.
    #[instrument(level = "debug", skip_all, fields(sheet_count = workbook.sheets.len()))]
    pub fn from_workbook(workbook: &WorkbookSnapshot) -> Self {
        let mut set = ReturnedSet::default();
        let mut dropped = 0usize;

        for sheet in &workbook.sheets {
            for cell in sheet.rows.iter().flatten() {
                for token in cell_tokens(cell).split_whitespace() {
                    if set.insert_token(token) == 0 {
                        dropped += 1;
                    }
                }
            }
        }

        info!(
            code_count = set.codes.len(),
            whole_group_count = set.whole_groups.len(),
            "built returned set"
        );
        debug!(dropped, "ignored non-code tokens");
        set
    }

    /// Inserts every code found in a token and returns how many were found.
    pub fn insert_token(&mut self, token: &str) -> usize {
        let found = scan_tokens(token);
        for parsed in &found {
            match parsed {
                ReturnedToken::Task(code) => {
                    self.codes.insert(*code);
                }
                ReturnedToken::WholeGroup(group) => {
                    self.whole_groups.insert(*group);
                }
            }
        }
        found.len()
    }

    /// Membership test on the normalized code; a `GGAL` entry covers the
    /// whole group.
    pub fn contains(&self, code: &TaskCode) -> bool {
        self.codes.contains(code) || self.whole_groups.contains(&code.group())
    }

    /// Tests a raw token such as `0301` or `03-01`.
    pub fn contains_token(&self, token: &str) -> bool {
        match parse_token(token) {
            Some(ReturnedToken::Task(code)) => self.contains(&code),
            Some(ReturnedToken::WholeGroup(group)) => self.whole_groups.contains(&group),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len() + self.whole_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.whole_groups.is_empty()
    }
}

/// Spreadsheets store `0101` typed as a number as `101`; restore the
/// four-digit form before tokenising.
fn cell_tokens(cell: &CellValue) -> String {
    match cell {
        CellValue::Number(value)
            if value.fract() == 0.0 && (1.0..=9999.0).contains(value) =>
        {
            format!("{:04}", *value as u32)
        }
        CellValue::Text(text) => text.clone(),
        _ => String::new(),
    }
}
