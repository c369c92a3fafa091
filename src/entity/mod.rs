//! Entity module - SeaORM entity definitions
//!
//! One module per table of the offer schema

pub mod role_offer;
pub mod user_offer;
pub mod user_role_offer;
