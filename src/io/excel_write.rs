use std::path::Path;

use rust_xlsxwriter::{Chart, ChartType, Format, Table, Workbook, Worksheet};

use crate::error::Result;
use crate::model::{CellValue, WorkbookSnapshot};
use crate::report::{SheetTable, WorkbookData};

const DATE_FORMAT: &str = "yyyy-mm-dd";

/// Writes the report tables to the given path, one sheet per table.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let header_format = Format::new().set_bold();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, header, &header_format)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                write_cell(worksheet, (row_idx + 1) as u32, col_idx as u16, cell)?;
            }
        }

        if !table.rows.is_empty() {
            let mut excel_table = Table::new();
            excel_table.set_autofilter(true);
            let col_end = (table.columns.len() as u16).saturating_sub(1);
            worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
        }

        if let Some(chart_column) = table.chart_column {
            insert_column_chart(worksheet, table, chart_column)?;
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}

/// Writes an in-memory workbook snapshot, cell values only.
pub fn write_snapshot(path: &Path, snapshot: &WorkbookSnapshot) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for sheet in &snapshot.sheets {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (row_idx, row) in sheet.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                write_cell(worksheet, row_idx as u32, col_idx as u16, cell)?;
            }
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(value) => {
            worksheet.write_string(row, col, value)?;
        }
        CellValue::Number(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        CellValue::DateTime(value) => {
            let date_format = Format::new().set_num_format(DATE_FORMAT);
            worksheet.write_number_with_format(row, col, *value, &date_format)?;
        }
        CellValue::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
    }
    Ok(())
}

fn insert_column_chart(
    worksheet: &mut Worksheet,
    table: &SheetTable,
    value_column: usize,
) -> Result<()> {
    if table.rows.is_empty() {
        return Ok(());
    }

    let last_row = table.rows.len() as u32;
    let value_col = value_column as u16;
    let series_name = table
        .columns
        .get(value_column)
        .cloned()
        .unwrap_or_default();

    let mut chart = Chart::new(ChartType::Column);
    chart
        .add_series()
        .set_name(series_name.as_str())
        .set_categories((table.sheet_name.as_str(), 1, 0, last_row, 0))
        .set_values((table.sheet_name.as_str(), 1, value_col, last_row, value_col));
    chart.title().set_name(series_name.as_str());

    worksheet.insert_chart(1, table.columns.len() as u16 + 1, &chart)?;
    Ok(())
}
