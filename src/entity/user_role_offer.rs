//! UserRoleOffer entity - permission table
//!
//! Table: user_role_offer. A permission row always belongs to one user
//! (user_id) and points at one role (role_id).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_role_offer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Permission type (free text from the spreadsheet, may be empty)
    #[sea_orm(column_name = "type", column_type = "String(Some(50))")]
    pub kind: String,

    pub role_id: i64,

    #[sea_orm(column_type = "String(Some(200))")]
    pub bank: String,

    #[sea_orm(column_type = "String(Some(200))")]
    pub branch: String,

    /// NULL means open towards the past
    #[sea_orm(nullable)]
    pub from_date: Option<Date>,

    /// NULL means open towards the future
    #[sea_orm(nullable)]
    pub to_date: Option<Date>,

    pub user_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Cross-table relations are resolved with manual queries

impl ActiveModelBehavior for ActiveModel {}
