//! Spreadsheet user and permission import
//!
//! Reads a two-sheet workbook, validates each row against the stored
//! users and roles, and persists accepted users with their permissions
//! in one transaction.

pub mod duplicate;
pub mod engine;
pub mod error;
pub mod index;
pub mod issue;
pub mod outcome;
pub mod permission_row;
pub mod record;
pub mod sheet;
pub mod user_row;

pub use engine::UserImporter;
pub use error::ImportError;
pub use outcome::ImportOutcome;
