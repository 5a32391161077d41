use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};
use tracing::{debug, instrument};

use crate::error::{Result, ToolError};
use crate::model::{CellValue, SheetSnapshot, WorkbookSnapshot};

/// Loads every sheet of a workbook into memory. Cells keep their absolute
/// position, so row `0` of a snapshot is always spreadsheet row 1.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_workbook(path: &Path) -> Result<WorkbookSnapshot> {
    if !path.is_file() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = match workbook.worksheet_range(&name) {
            Some(range) => range?,
            None => continue,
        };

        let mut sheet = SheetSnapshot::new(name);
        let (first_row, first_col) = range.start().unwrap_or((0, 0));
        for (row_offset, row) in range.rows().enumerate() {
            for (col_offset, cell) in row.iter().enumerate() {
                let value = cell_value(cell);
                if value == CellValue::Empty {
                    continue;
                }
                sheet.set(
                    first_row as usize + row_offset,
                    first_col as usize + col_offset,
                    value,
                );
            }
        }
        debug!(sheet = %sheet.name, row_count = sheet.rows.len(), "loaded sheet");
        sheets.push(sheet);
    }

    Ok(WorkbookSnapshot { sheets })
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::DateTime(value) => CellValue::DateTime(*value),
        DataType::Duration(value) => CellValue::Number(*value),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}
