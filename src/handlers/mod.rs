//! Request handlers module

pub mod import;
pub mod role;
pub mod user;
