//! IMS import - spreadsheet user and permission import service
//!
//! This crate provides the import engine that reconciles a two-sheet
//! workbook against stored users and roles, plus the HTTP service around it.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod import;
pub mod routes;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use import::{ImportError, ImportOutcome, UserImporter};
pub use state::AppState;
