//! Header validation and typed cell access shared by the three CSV uploads.

use crate::database_ops::error::{ServiceError, ServiceResult};
use crate::normalization::{parse_date, Hundredths};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};

/// Rows per multi-row INSERT; keeps every statement well under SQLite's bind limit.
pub const INSERT_CHUNK_ROWS: usize = 500;

/// Columns an uploaded CSV must carry. Extra columns are ignored.
#[derive(Debug, Clone, Copy)]
pub struct CsvLayout {
    pub required: &'static [&'static str],
}

impl CsvLayout {
    fn missing_columns_error(&self) -> ServiceError {
        ServiceError::validation(format!(
            "Invalid CSV file. Please make sure the file contains the following columns: {}.",
            self.required.join(", ")
        ))
    }
}

/// One data row, addressed by required-column name.
pub struct CsvRow<'a> {
    record: &'a StringRecord,
    layout: &'a CsvLayout,
    positions: &'a [usize],
}

impl CsvRow<'_> {
    fn cell(&self, column: &str) -> Result<&str, String> {
        let slot = self
            .layout
            .required
            .iter()
            .position(|c| *c == column)
            .ok_or_else(|| format!("column `{column}` is not part of this layout"))?;
        Ok(self.record.get(self.positions[slot]).unwrap_or(""))
    }

    pub fn int(&self, column: &str) -> Result<i64, String> {
        let raw = self.cell(column)?;
        raw.parse::<i64>()
            .map_err(|_| format!("`{column}` must be an integer, got `{raw}`"))
    }

    pub fn decimal(&self, column: &str, max_digits: u32) -> Result<Hundredths, String> {
        Hundredths::parse(self.cell(column)?, max_digits).map_err(|e| format!("`{column}`: {e}"))
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate, String> {
        parse_date(self.cell(column)?).map_err(|e| format!("`{column}`: {e}"))
    }
}

/// Parse `data` into typed rows.
///
/// Fails with `Validation` before reading any row when a required column is
/// missing, and with `Parse` (carrying the 1-based line) on the first bad cell.
pub fn read_rows<T, F>(data: &str, layout: &CsvLayout, mut parse: F) -> ServiceResult<Vec<T>>
where
    F: FnMut(&CsvRow<'_>) -> Result<T, String>,
{
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(data.as_bytes());

    let headers = rdr.headers()?.clone();
    let positions = layout
        .required
        .iter()
        .map(|col| headers.iter().position(|h| h == *col))
        .collect::<Option<Vec<usize>>>()
        .ok_or_else(|| layout.missing_columns_error())?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = CsvRow {
            record: &record,
            layout,
            positions: &positions,
        };
        rows.push(parse(&row).map_err(|message| ServiceError::Parse { line, message })?);
    }
    Ok(rows)
}
