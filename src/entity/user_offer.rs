//! UserOffer entity - user table
//!
//! Table: user_offer

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_offer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Username (unique business key)
    #[sea_orm(column_type = "String(Some(50))", unique)]
    pub user_name: String,

    #[sea_orm(column_type = "String(Some(200))")]
    pub full_name: String,

    #[sea_orm(column_type = "String(Some(200))")]
    pub email: String,

    /// Normalized 10-digit phone number
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub phone: Option<String>,

    #[sea_orm(nullable)]
    pub birth_day: Option<Date>,

    /// MALE / FEMALE, NULL when unset
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub gender: Option<String>,

    #[sea_orm(column_type = "String(Some(50))")]
    pub status: String,

    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub created_by: Option<String>,

    #[sea_orm(nullable)]
    pub created_time: Option<DateTime>,

    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub updated_by: Option<String>,

    #[sea_orm(nullable)]
    pub updated_time: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Permissions are loaded by user_id through manual queries

impl ActiveModelBehavior for ActiveModel {}
