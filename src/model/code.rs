use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};

lazy_static! {
    /// A dashed code embedded in free text, e.g. "任务 03-01 道路抄平".
    static ref EMBEDDED_CODE_RE: Regex =
        Regex::new(r"(?:^|\D)(\d{1,3})\s*[-－‐–]\s*(\d{1,3})(?:\D|$)").unwrap();
    /// A whole token: dashed ("3-1", "03-01") or compact ("0301", "03AL").
    static ref TOKEN_RE: Regex =
        Regex::new(r"(?i)^(?:(\d{1,3})[-－‐–](\d{1,3})|(\d{2})(\d{2}|AL))$").unwrap();
    /// Maximal ASCII digit runs, so a code never starts or ends inside a
    /// longer number.
    static ref DIGIT_RUN_RE: Regex = Regex::new(r"[0-9]+").unwrap();
}

const DASHES: [char; 4] = ['-', '－', '‐', '–'];

/// Two-segment task identifier: the task group (one sheet per group in the
/// task-definition workbook) and the task index inside that group.
///
/// The canonical text form is `GG-II`, e.g. `03-01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskCode {
    group: u16,
    index: u16,
}

/// A single token recognised in the returned-tasks workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnedToken {
    /// One specific task.
    Task(TaskCode),
    /// `GGAL`: every task of the group has been returned.
    WholeGroup(u16),
}

impl TaskCode {
    pub fn new(group: u16, index: u16) -> Self {
        Self { group, index }
    }

    pub fn group(&self) -> u16 {
        self.group
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    /// Compact form without a separator, as used by the returned-tasks table.
    pub fn compact(&self) -> String {
        format!("{:02}{:02}", self.group, self.index)
    }

    /// Finds the first dashed code inside a free-text cell.
    pub fn find_in(text: &str) -> Option<TaskCode> {
        let captures = EMBEDDED_CODE_RE.captures(text)?;
        let group = captures.get(1)?.as_str().parse().ok()?;
        let index = captures.get(2)?.as_str().parse().ok()?;
        Some(TaskCode::new(group, index))
    }
}

impl fmt::Display for TaskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.group, self.index)
    }
}

impl Serialize for TaskCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses a token holding exactly one code, such as `0301`, `3-1` or `03AL`.
///
/// Surrounding punctuation is ignored. Returns `None` for anything that is
/// not a task code, and for the `0000` "mapping unknown" marker.
pub fn parse_token(token: &str) -> Option<ReturnedToken> {
    let token = token.trim_matches(|ch: char| !ch.is_alphanumeric());
    let captures = TOKEN_RE.captures(token)?;

    let (group, index) = match (captures.get(1), captures.get(2)) {
        (Some(group), Some(index)) => (group.as_str(), index.as_str()),
        _ => (captures.get(3)?.as_str(), captures.get(4)?.as_str()),
    };
    let group: u16 = group.parse().ok()?;

    if index.eq_ignore_ascii_case("AL") {
        return Some(ReturnedToken::WholeGroup(group));
    }

    let index: u16 = index.parse().ok()?;
    if group == 0 && index == 0 {
        return None;
    }
    Some(ReturnedToken::Task(TaskCode::new(group, index)))
}

/// Finds every code packed into a piece of text, e.g. `0301,0302、0303` or
/// `03-01;03AL`.
///
/// Digit runs of four are compact codes, two digits followed by `AL` mark a
/// whole group, and two short runs joined by a single dash form a dashed
/// code. Other runs and the `0000` marker are skipped.
pub fn scan_tokens(text: &str) -> Vec<ReturnedToken> {
    let runs: Vec<regex::Match<'_>> = DIGIT_RUN_RE.find_iter(text).collect();
    let mut tokens = Vec::new();
    let mut idx = 0;

    while idx < runs.len() {
        let run = runs[idx];

        if let Some(next) = runs.get(idx + 1) {
            let between = &text[run.end()..next.start()];
            let joined = between.chars().count() == 1 && between.starts_with(DASHES);
            if joined && run.len() <= 3 && next.len() <= 3 {
                if let Some(code) = task_from_segments(run.as_str(), next.as_str()) {
                    tokens.push(ReturnedToken::Task(code));
                }
                idx += 2;
                continue;
            }
        }

        let rest = &text[run.end()..];
        let whole_group = rest
            .get(..2)
            .is_some_and(|suffix| suffix.eq_ignore_ascii_case("AL"));
        match run.len() {
            2 if whole_group => {
                if let Ok(group) = run.as_str().parse() {
                    tokens.push(ReturnedToken::WholeGroup(group));
                }
            }
            4 => {
                let digits = run.as_str();
                if let Some(code) = task_from_segments(&digits[..2], &digits[2..]) {
                    tokens.push(ReturnedToken::Task(code));
                }
            }
            _ => {}
        }
        idx += 1;
    }

    tokens
}

fn task_from_segments(group: &str, index: &str) -> Option<TaskCode> {
    let group: u16 = group.parse().ok()?;
    let index: u16 = index.parse().ok()?;
    if group == 0 && index == 0 {
        return None;
    }
    Some(TaskCode::new(group, index))
}

/// Normalises a code token to its canonical dashed form (`GG-II`, or `GGAL`
/// for whole-group markers).
pub fn normalize(token: &str) -> Option<String> {
    parse_token(token).map(|parsed| match parsed {
        ReturnedToken::Task(code) => code.to_string(),
        ReturnedToken::WholeGroup(group) => format!("{group:02}AL"),
    })
}
