//! Raw report extracts: CSV decoding, column lookup, and cell parsing.

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::error::{MailKpiError, Result};

/// Cell values treated as empty, as spreadsheet exports write them.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#NA", "N/A", "NA", "n/a", "<NA>", "NULL", "null", "NaN", "-NaN", "nan", "-nan",
];

/// A decoded CSV extract with its header row.
pub struct Sheet {
    report: &'static str,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Sheet {
    /// Parse CSV bytes. A UTF-8 BOM is skipped; bytes that are not valid
    /// UTF-8 are read as Windows-1252.
    pub fn parse(report: &'static str, bytes: &[u8]) -> Result<Self> {
        let text = decode_text(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|source| MailKpiError::Csv { report, source })?
            .iter()
            .map(str::trim)
            .collect::<StringRecord>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| MailKpiError::Csv { report, source })?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record);
        }

        Ok(Self {
            report,
            headers,
            rows,
        })
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Position of a column that must be present.
    pub fn column(&self, name: &'static str) -> Result<usize> {
        self.find_column(name)
            .ok_or(MailKpiError::MissingColumn {
                report: self.report,
                column: name,
            })
    }

    /// Position of a column, if present.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// The cell at `col`, or `None` when it is empty or an NA token.
    pub fn cell<'a>(&self, row: &'a StringRecord, col: usize) -> Option<&'a str> {
        row.get(col).map(str::trim).filter(|v| !is_null(v))
    }

    /// Parse an optional date cell with a `strftime` format.
    pub fn date(
        &self,
        row: &StringRecord,
        row_no: usize,
        col: usize,
        column: &'static str,
        format: &str,
    ) -> Result<Option<NaiveDate>> {
        match self.cell(row, col) {
            None => Ok(None),
            Some(v) => NaiveDate::parse_from_str(v, format)
                .map(Some)
                .map_err(|_| self.invalid(row_no, column, v)),
        }
    }

    /// Parse an optional timestamp cell with a `strftime` format.
    pub fn datetime(
        &self,
        row: &StringRecord,
        row_no: usize,
        col: usize,
        column: &'static str,
        format: &str,
    ) -> Result<Option<NaiveDateTime>> {
        match self.cell(row, col) {
            None => Ok(None),
            Some(v) => NaiveDateTime::parse_from_str(v, format)
                .map(Some)
                .map_err(|_| self.invalid(row_no, column, v)),
        }
    }

    /// Parse an optional numeric cell.
    pub fn number(
        &self,
        row: &StringRecord,
        row_no: usize,
        col: usize,
        column: &'static str,
    ) -> Result<Option<f64>> {
        match self.cell(row, col) {
            None => Ok(None),
            Some(v) => v
                .replace(',', "")
                .parse::<f64>()
                .map(|n| Some(n).filter(|n| !n.is_nan()))
                .map_err(|_| self.invalid(row_no, column, v)),
        }
    }

    fn invalid(&self, row: usize, column: &'static str, value: &str) -> MailKpiError {
        MailKpiError::InvalidValue {
            report: self.report,
            column,
            row,
            value: value.to_string(),
        }
    }
}

/// Whether a trimmed cell counts as empty.
pub fn is_null(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

/// Decode extract bytes to text.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
