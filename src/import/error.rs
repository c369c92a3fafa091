//! Run-level import failures
//!
//! These abort a run before any row is processed (or while saving the
//! batch). Row-level problems are `RowError`s and never surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid file format, expected {0}")]
    InvalidFileType(&'static str),

    #[error("File is missing sheet '{users}' or '{permissions}'")]
    MissingSheet { users: String, permissions: String },

    #[error("Unable to read workbook: {0}")]
    Workbook(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl ImportError {
    /// Problems with the submitted file itself, as opposed to the backend
    pub fn is_structural(&self) -> bool {
        !matches!(self, ImportError::Database(_))
    }
}
