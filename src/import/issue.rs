//! Row diagnostics

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Row is excluded from the batch
    Error,
    /// Row proceeds on a non-default path
    Warning,
}

/// Which sheet a row came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SheetKind {
    Users,
    Permissions,
}

impl SheetKind {
    /// Label used in issue messages
    pub fn label(&self) -> &'static str {
        match self {
            SheetKind::Users => "Sheet User",
            SheetKind::Permissions => "Sheet Permission",
        }
    }
}

/// One diagnostic attached to a spreadsheet row
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub sheet: SheetKind,
    /// 1-based row number as shown by spreadsheet applications
    pub row: u32,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(sheet: SheetKind, row: u32, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            sheet,
            row,
            message: message.into(),
        }
    }

    pub fn warning(sheet: SheetKind, row: u32, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            sheet,
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - Row {}: {}", self.sheet.label(), self.row, self.message)
    }
}

/// Why a single row was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Every rule violation found on the row
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Invalid date format (dd/MM/yyyy)")]
    DateFormat,

    /// Conflicts with an existing permission
    #[error("{0}")]
    Duplicate(String),

    /// Anything else that went wrong while handling the row
    #[error("Unclassified error - {0}")]
    Unexpected(String),
}

impl From<sea_orm::DbErr> for RowError {
    fn from(err: sea_orm::DbErr) -> Self {
        RowError::Unexpected(err.to_string())
    }
}

/// Turn an accumulator of violations into a row result
pub fn finish<T>(violations: Vec<String>, value: impl FnOnce() -> T) -> Result<T, RowError> {
    if violations.is_empty() {
        Ok(value())
    } else {
        Err(RowError::Invalid(violations))
    }
}
