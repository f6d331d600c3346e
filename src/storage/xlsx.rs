//! Spreadsheet reading (calamine) and export (rust_xlsxwriter)
//!
//! The first row of a worksheet is the header; every following row that is
//! not completely empty becomes a record. Excel date cells are read as
//! [`CellValue::DateTime`] and written back as date-formatted numbers, so an
//! export can be loaded again with the same values.

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};

use crate::analytics::dates::datetime_to_excel_serial;
use crate::analytics::report::ExportTable;
use crate::error::{Error, Result};
use crate::models::{CellValue, Dataset};

/// Number format applied to exported date cells
const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Names of all worksheets in a workbook file
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)?;
    Ok(workbook.sheet_names().to_vec())
}

/// Read one worksheet of a workbook file
///
/// Reads the first worksheet unless `sheet` names another one.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path)?;
    let dataset = read_sheet(&mut workbook, sheet)?;

    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Loaded workbook"
    );
    Ok(dataset)
}

/// Read one worksheet of an in-memory workbook
pub fn read_workbook_bytes(bytes: &[u8], sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    read_sheet(&mut workbook, sheet)
}

/// Read every worksheet of an in-memory workbook, in workbook order
pub fn read_all_sheets_bytes(bytes: &[u8]) -> Result<Vec<(String, Dataset)>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let names = workbook.sheet_names().to_vec();
    if names.is_empty() {
        return Err(Error::EmptyWorkbook);
    }

    names
        .into_iter()
        .map(|name| {
            let range = workbook.worksheet_range(&name)?;
            Ok((name, range_to_dataset(&range)))
        })
        .collect()
}

fn read_sheet<RS>(workbook: &mut Sheets<RS>, sheet: Option<&str>) -> Result<Dataset>
where
    RS: Read + Seek,
{
    let names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| Error::SheetNotFound(wanted.to_string()))?,
        None => names.first().cloned().ok_or(Error::EmptyWorkbook)?,
    };

    let range = workbook.worksheet_range(&name)?;
    debug!(sheet = %name, size = ?range.get_size(), "Reading worksheet");
    Ok(range_to_dataset(&range))
}

fn range_to_dataset(range: &Range<Data>) -> Dataset {
    let mut rows = range.rows();

    let headers: Vec<Option<String>> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| convert_cell(cell).as_text().map(|t| t.into_owned()))
            .collect(),
        None => return Dataset::default(),
    };

    let records: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(CellValue::is_empty))
        .collect();

    Dataset::from_raw_headers(headers, records)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Float(*n),
        Data::Int(n) => CellValue::Int(*n),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
        // as_datetime honours the workbook's 1904 date system
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Build an xlsx workbook with one worksheet per table, in table order
pub fn export_workbook(tables: &[ExportTable]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(tables)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write the export workbook to a file
pub fn save_workbook(tables: &[ExportTable], path: &Path) -> Result<()> {
    let mut workbook = build_workbook(tables)?;
    workbook.save(path)?;

    info!(
        path = %path.display(),
        sheets = tables.len(),
        rows = tables.iter().map(ExportTable::len).sum::<usize>(),
        "Saved export workbook"
    );
    Ok(())
}

fn build_workbook(tables: &[ExportTable]) -> Result<Workbook> {
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);

    let mut workbook = Workbook::new();
    for table in tables {
        let worksheet = workbook.add_worksheet().set_name(&table.sheet_name)?;
        write_table(worksheet, table, &header_format, &date_format)?;
        debug!(sheet = %table.sheet_name, rows = table.len(), "Wrote worksheet");
    }

    Ok(workbook)
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &ExportTable,
    header_format: &Format,
    date_format: &Format,
) -> Result<()> {
    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_index(col)?, name, header_format)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let row_idx = u32::try_from(i + 1)
            .map_err(|_| Error::config(format!("too many rows for sheet '{}'", table.sheet_name)))?;

        for (col, cell) in row.iter().enumerate() {
            let col_idx = col_index(col)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row_idx, col_idx, s)?;
                }
                CellValue::Int(n) => {
                    worksheet.write_number(row_idx, col_idx, *n as f64)?;
                }
                CellValue::Float(n) => {
                    worksheet.write_number(row_idx, col_idx, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_idx, col_idx, *b)?;
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_number_with_format(
                        row_idx,
                        col_idx,
                        datetime_to_excel_serial(*dt),
                        date_format,
                    )?;
                }
            }
        }
    }

    Ok(())
}

fn col_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::config(format!("column index {col} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;

    fn table(sheet: &str) -> ExportTable {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ExportTable {
            category: "admin".into(),
            sheet_name: sheet.into(),
            columns: vec!["Дата".into(), "Текст".into(), "Оценка".into()],
            rows: vec![
                vec![CellValue::DateTime(dt), "Касса закрыта".into(), CellValue::Int(2)],
                vec![CellValue::Empty, "Регистратура".into(), CellValue::Float(3.5)],
            ],
        }
    }

    #[test]
    fn test_export_then_read_back() {
        let bytes = export_workbook(&[table("Регистратура_Администратор")]).unwrap();
        let ds = read_workbook_bytes(&bytes, None).unwrap();

        assert_eq!(ds.columns(), &["Дата", "Текст", "Оценка"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.row(0).unwrap()[1], CellValue::from("Касса закрыта"));
        assert!(matches!(ds.row(0).unwrap()[0], CellValue::DateTime(_)));
        assert!(ds.row(1).unwrap()[0].is_empty());
    }

    #[test]
    fn test_every_table_gets_a_sheet() {
        let bytes = export_workbook(&[table("First"), table("Second")]).unwrap();
        let sheets = read_all_sheets_bytes(&bytes).unwrap();

        let names: Vec<&str> = sheets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);

        let second = read_workbook_bytes(&bytes, Some("Second")).unwrap();
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_missing_sheet() {
        let bytes = export_workbook(&[table("Only")]).unwrap();
        let err = read_workbook_bytes(&bytes, Some("Other")).unwrap_err();
        assert!(matches!(err, Error::SheetNotFound(ref s) if s == "Other"));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let mut empty = table("Empty");
        empty.rows.clear();
        let bytes = export_workbook(&[empty]).unwrap();
        let ds = read_workbook_bytes(&bytes, None).unwrap();

        assert_eq!(ds.columns().len(), 3);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_invalid_sheet_name_is_rejected() {
        let err = export_workbook(&[table("bad/name")]).unwrap_err();
        assert!(matches!(err, Error::Xlsx(_)));
    }

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(convert_cell(&Data::Int(7)), CellValue::Int(7));
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-01-02".into())),
            CellValue::DateTime(
                NaiveDate::from_ymd_opt(2024, 1, 2)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_convert_cell_date_systems() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let in_1900 = ExcelDateTime::new(45356.0, ExcelDateTimeType::DateTime, false);
        let in_1904 = ExcelDateTime::new(45356.0 - 1462.0, ExcelDateTimeType::DateTime, true);

        assert_eq!(convert_cell(&Data::DateTime(in_1900)), CellValue::DateTime(expected));
        assert_eq!(convert_cell(&Data::DateTime(in_1904)), CellValue::DateTime(expected));
    }
}
