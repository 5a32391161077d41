mod code;

use std::fmt;

use serde::Serialize;

pub use code::{ReturnedToken, TaskCode, normalize, parse_token, scan_tokens};

/// Value of a single worksheet cell, reduced to what the reconciliation and
/// the processed copy need.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// Excel date serial, kept apart from plain numbers so it is written back
    /// with a date format.
    DateTime(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering of the cell. Integral numbers are printed without a
    /// fractional part.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            CellValue::Number(value) | CellValue::DateTime(value) => value.to_string(),
            CellValue::Bool(value) => value.to_string(),
        }
    }
}

/// All cells of one worksheet, addressed from `A1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetSnapshot {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Widest row of the sheet, in columns.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Sets a cell, growing the grid as needed.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }
}

/// A whole workbook held in memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookSnapshot {
    pub sheets: Vec<SheetSnapshot>,
}

/// Work category assigned from a task's descriptive text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    /// 道路抄平
    RoadLeveling,
    /// 核补地形
    CoreSupplementTopography,
    Uncategorized,
}

impl Category {
    /// Every category in report order.
    pub const ALL: [Category; 3] = [
        Category::RoadLeveling,
        Category::CoreSupplementTopography,
        Category::Uncategorized,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::RoadLeveling => "道路抄平",
            Category::CoreSupplementTopography => "核补地形",
            Category::Uncategorized => "未分类",
        }
    }

    /// ASCII label used where CJK text cannot be rendered, e.g. the PNG chart.
    pub fn chart_label(&self) -> &'static str {
        match self {
            Category::RoadLeveling => "ROAD LEVELING",
            Category::CoreSupplementTopography => "CORE SUPPLEMENT",
            Category::Uncategorized => "UNCATEGORIZED",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One task found in the task-definition workbook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub code: TaskCode,
    pub sheet_name: String,
    /// Zero-based row of the task inside its sheet.
    pub row: usize,
    pub description: String,
    pub category: Category,
    pub returned: bool,
}

impl TaskRecord {
    /// Creates an unclassified, not yet returned record.
    pub fn new(
        code: TaskCode,
        sheet_name: impl Into<String>,
        row: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            code,
            sheet_name: sheet_name.into(),
            row,
            description: description.into(),
            category: Category::Uncategorized,
            returned: false,
        }
    }
}
