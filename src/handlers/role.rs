//! Role handlers

use axum::{extract::State, response::Json};
use sea_orm::{EntityTrait, QueryOrder};
use serde::Serialize;

use crate::entity::role_offer;
use crate::error::AppResult;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Role response
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: i64,
    #[serde(rename = "roleName")]
    pub role_name: String,
    pub status: Option<String>,
    pub description: Option<String>,
}

impl From<role_offer::Model> for RoleResponse {
    fn from(m: role_offer::Model) -> Self {
        Self {
            id: m.id,
            role_name: m.role_name,
            status: m.status,
            description: m.description,
        }
    }
}

/// GET /api/roles
pub async fn list_roles(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<RoleResponse>>>> {
    let roles = role_offer::Entity::find()
        .order_by_asc(role_offer::Column::RoleName)
        .all(&state.db)
        .await?;
    Ok(Json(ApiResponse::success(
        roles.into_iter().map(RoleResponse::from).collect(),
    )))
}
