//! Workbook decoding. Turns the first worksheet of an xlsx/xls payload into
//! header-keyed rows of typed cells.

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use chrono::NaiveDate;
use pulse_core::{PulseError, PulseResult};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

/// Decoded cell value. Spreadsheet dates keep their calendar date; every
/// other non-numeric value is carried as text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
            Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_date() {
                Some(date) => CellValue::Date(date),
                None => CellValue::Text(cell.to_string()),
            },
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// One data row keyed by header name. Columns with a blank header are dropped.
pub type SheetRow = HashMap<String, CellValue>;

/// Decode the first worksheet. The first row is the header; fully blank rows
/// are skipped.
pub fn read_first_sheet(bytes: &[u8]) -> PulseResult<Vec<SheetRow>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| PulseError::Spreadsheet(format!("unreadable workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PulseError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| PulseError::Spreadsheet(format!("unreadable worksheet: {e}")))?;

    let mut rows = range.rows();
    let header: Vec<Option<String>> = match rows.next() {
        Some(cells) => cells
            .iter()
            .map(|cell| {
                let name = cell.to_string().trim().to_string();
                (!name.is_empty()).then_some(name)
            })
            .collect(),
        None => return Ok(Vec::new()),
    };

    let parsed: Vec<SheetRow> = rows
        .filter_map(|cells| {
            let row: SheetRow = header
                .iter()
                .zip(cells.iter())
                .filter_map(|(name, cell)| {
                    let name = name.as_ref()?;
                    Some((name.clone(), CellValue::from(cell)))
                })
                .collect();
            (!row.values().all(CellValue::is_empty)).then_some(row)
        })
        .collect();

    debug!(columns = header.len(), rows = parsed.len(), "Worksheet decoded");
    Ok(parsed)
}
