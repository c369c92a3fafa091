//! RoleOffer entity - role table
//!
//! Table: role_offer. Read-only lookup data for the importer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role_offer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Role name, matched case-insensitively
    #[sea_orm(column_type = "String(Some(255))")]
    pub role_name: String,

    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub status: Option<String>,

    #[sea_orm(column_type = "String(Some(200))", nullable)]
    pub description: Option<String>,

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

impl ActiveModelBehavior for ActiveModel {}
