//! Spreadsheet access
//!
//! Wraps calamine ranges so the validators only ever see trimmed display
//! strings and calendar dates, addressed by absolute (row, column).

use std::io::{Cursor, Read, Seek};
use std::ops::Range as RowRange;

use calamine::{Data, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::ImportError;
use super::issue::RowError;
use crate::config::ImportConfig;

/// Rows above the data (title, notes, column headers)
pub const HEADER_ROWS: u32 = 3;

pub const FILE_EXTENSION: &str = ".xlsx";

/// Text date format accepted in date columns
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Two-digit day and month, four-digit year; chrono alone accepts `1/1/20`
static DATE_TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());

/// One worksheet
#[derive(Debug, Clone)]
pub struct Sheet {
    range: Range<Data>,
}

impl From<Range<Data>> for Sheet {
    fn from(range: Range<Data>) -> Self {
        Self { range }
    }
}

impl Sheet {
    /// Index of the last used row, `None` for an empty sheet
    pub fn last_row(&self) -> Option<u32> {
        self.range.end().map(|(row, _)| row)
    }

    /// Row indices below the header block
    pub fn data_rows(&self) -> RowRange<u32> {
        match self.last_row() {
            Some(last) if last >= HEADER_ROWS => HEADER_ROWS..last + 1,
            _ => 0..0,
        }
    }

    /// Trimmed display text of a cell, empty when absent
    pub fn text(&self, row: u32, col: u32) -> String {
        self.range
            .get_value((row, col))
            .map(display_text)
            .unwrap_or_default()
    }

    /// Calendar date of a cell, either a native date or `dd/MM/yyyy` text
    pub fn date(&self, row: u32, col: u32) -> Result<Option<NaiveDate>, RowError> {
        match self.range.get_value((row, col)) {
            Some(cell) => parse_date(cell),
            None => Ok(None),
        }
    }

    /// Whether every cell of the row is empty or whitespace
    pub fn is_row_blank(&self, row: u32) -> bool {
        let (Some((_, first)), Some((_, last))) = (self.range.start(), self.range.end()) else {
            return true;
        };
        (first..=last).all(|col| self.text(row, col).is_empty())
    }
}

/// The two sheets an import needs
#[derive(Debug, Clone)]
pub struct Workbook {
    pub users: Sheet,
    pub permissions: Sheet,
}

impl Workbook {
    pub fn new(users: Sheet, permissions: Sheet) -> Self {
        Self { users, permissions }
    }

    /// Open an uploaded `.xlsx` file and locate both sheets
    pub fn open(file_name: &str, bytes: Vec<u8>, config: &ImportConfig) -> Result<Self, ImportError> {
        if !file_name.ends_with(FILE_EXTENSION) {
            return Err(ImportError::InvalidFileType(FILE_EXTENSION));
        }

        let mut workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(bytes)).map_err(|e| ImportError::Workbook(e.to_string()))?;

        let names = workbook.sheet_names();
        if !names.contains(&config.user_sheet) || !names.contains(&config.permission_sheet) {
            return Err(ImportError::MissingSheet {
                users: config.user_sheet.clone(),
                permissions: config.permission_sheet.clone(),
            });
        }

        let users = read_sheet(&mut workbook, &config.user_sheet)?;
        let permissions = read_sheet(&mut workbook, &config.permission_sheet)?;
        Ok(Self::new(users, permissions))
    }
}

fn read_sheet<RS: Read + Seek>(workbook: &mut Xlsx<RS>, name: &str) -> Result<Sheet, ImportError> {
    workbook
        .worksheet_range(name)
        .map(Sheet::from)
        .map_err(|e| ImportError::Workbook(format!("sheet '{}': {}", name, e)))
}

/// Last serial Excel can represent (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.0;

/// Excel serial day number to date (1899-12-30 epoch)
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn display_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Numeric cells such as phone numbers read without a fractional part
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => match serial_to_date(dt.as_f64()) {
            Some(date) => date.format(DATE_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.trim().to_string(),
        Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(e) => e.to_string(),
    }
}

fn parse_date(cell: &Data) -> Result<Option<NaiveDate>, RowError> {
    match cell {
        Data::Empty => Ok(None),
        Data::DateTime(dt) => serial_to_date(dt.as_f64())
            .map(Some)
            .ok_or(RowError::DateFormat),
        Data::DateTimeIso(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| RowError::DateFormat)
        }
        other => {
            let text = display_text(other);
            if text.is_empty() {
                return Ok(None);
            }
            if !DATE_TEXT_RE.is_match(&text) {
                return Err(RowError::DateFormat);
            }
            NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map(Some)
                .map_err(|_| RowError::DateFormat)
        }
    }
}

/// Build a sheet with the header block followed by `rows`; "" is an empty cell
#[cfg(test)]
pub(crate) fn test_sheet(rows: &[&[&str]]) -> Sheet {
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(1).max(1) as u32;
    let height = HEADER_ROWS + rows.len() as u32;
    let mut range = Range::new((0, 0), (height - 1, width - 1));
    range.set_value((0, 0), Data::String("Import template".to_string()));
    range.set_value((2, 0), Data::String("Header".to_string()));
    for (i, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                range.set_value(
                    (HEADER_ROWS + i as u32, col as u32),
                    Data::String(value.to_string()),
                );
            }
        }
    }
    Sheet::from(range)
}
