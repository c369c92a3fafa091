//! User handlers
//!
//! Listing and manual maintenance of users and their permissions

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::{role_offer, user_offer, user_role_offer};
use crate::error::{AppError, AppResult, OptionExt};
use crate::import::record::{Gender, PermissionRecord, RoleRef, UserRecord, UserStatus};
use crate::import::user_row::{is_valid_email, normalize_phone};
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::store::sea::permission_model;
use crate::store::ImportStore;

/// Audit actor for changes made through the API
const ADMIN_ACTOR: &str = "ADMIN";

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Permission as returned to clients
#[derive(Debug, Serialize)]
pub struct UserRoleResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub bank: String,
    pub branch: String,
    #[serde(rename = "roleId")]
    pub role_id: i64,
    #[serde(rename = "roleName")]
    pub role_name: Option<String>,
    #[serde(rename = "fromDate")]
    pub from_date: Option<NaiveDate>,
    #[serde(rename = "toDate")]
    pub to_date: Option<NaiveDate>,
}

impl UserRoleResponse {
    fn new(m: user_role_offer::Model, role_name: Option<String>) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            bank: m.bank,
            branch: m.branch,
            role_id: m.role_id,
            role_name,
            from_date: m.from_date,
            to_date: m.to_date,
        }
    }
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(rename = "birthDay")]
    pub birth_day: Option<NaiveDate>,
    pub gender: Option<String>,
    pub status: String,
    #[serde(rename = "createdBy")]
    pub created_by: Option<String>,
    #[serde(rename = "createdTime")]
    pub created_time: Option<NaiveDateTime>,
    #[serde(rename = "updatedBy")]
    pub updated_by: Option<String>,
    #[serde(rename = "updatedTime")]
    pub updated_time: Option<NaiveDateTime>,
    #[serde(rename = "userRoles")]
    pub user_roles: Vec<UserRoleResponse>,
}

impl UserResponse {
    fn new(m: user_offer::Model, user_roles: Vec<UserRoleResponse>) -> Self {
        Self {
            id: m.id,
            user_name: m.user_name,
            full_name: m.full_name,
            email: m.email,
            phone: m.phone,
            birth_day: m.birth_day,
            gender: m.gender,
            status: m.status,
            created_by: m.created_by,
            created_time: m.created_time,
            updated_by: m.updated_by,
            updated_time: m.updated_time,
            user_roles,
        }
    }
}

/// Page of results, numbered from 0
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub content: Vec<T>,
    #[serde(rename = "totalElements")]
    pub total_elements: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    pub size: u64,
    pub number: u64,
}

/// Query parameters for the user list
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub keyword: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

/// Permission in a create/update request; the role is named, not numbered
#[derive(Debug, Deserialize)]
pub struct UserRoleRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub bank: String,
    pub branch: String,
    #[serde(rename = "roleName")]
    pub role_name: String,
    #[serde(rename = "fromDate")]
    pub from_date: Option<NaiveDate>,
    #[serde(rename = "toDate")]
    pub to_date: Option<NaiveDate>,
}

/// Create/update user request
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(rename = "userName", default)]
    pub user_name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(rename = "birthDay")]
    pub birth_day: Option<NaiveDate>,
    pub gender: Option<String>,
    pub status: Option<String>,
    /// Replaces every stored permission when present
    #[serde(rename = "userRoles")]
    pub user_roles: Option<Vec<UserRoleRequest>>,
}

impl UserRequest {
    /// Check the fields and normalize the phone number
    fn validate(&mut self, require_username: bool) -> AppResult<()> {
        let mut violations = Vec::new();

        if require_username && self.user_name.trim().is_empty() {
            violations.push("Blank username".to_string());
        }
        if self.full_name.trim().is_empty() {
            violations.push("Blank full name".to_string());
        }
        if self.email.trim().is_empty() {
            violations.push("Blank email".to_string());
        } else if !is_valid_email(self.email.trim()) {
            violations.push("Invalid email format".to_string());
        }

        self.phone = match self.phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match normalize_phone(raw) {
                Some(phone) => Some(phone),
                None => {
                    violations.push("Invalid phone number".to_string());
                    None
                }
            },
        };

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(violations.join("; ")))
        }
    }
}

/// Case-insensitive match on username, full name or email
fn keyword_condition(keyword: &str) -> Condition {
    let pattern = format!("%{}%", keyword.to_lowercase());
    [
        user_offer::Column::UserName,
        user_offer::Column::FullName,
        user_offer::Column::Email,
    ]
    .into_iter()
    .fold(Condition::any(), |cond, col| {
        cond.add(Expr::expr(Func::lower(Expr::col((user_offer::Entity, col)))).like(pattern.clone()))
    })
}

/// Attach stored permissions (with role names) to each user
async fn with_permissions(
    db: &DatabaseConnection,
    users: Vec<user_offer::Model>,
) -> Result<Vec<UserResponse>, DbErr> {
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    let permissions = if ids.is_empty() {
        Vec::new()
    } else {
        user_role_offer::Entity::find()
            .filter(user_role_offer::Column::UserId.is_in(ids))
            .order_by_asc(user_role_offer::Column::Id)
            .all(db)
            .await?
    };

    let role_ids: HashSet<i64> = permissions.iter().map(|p| p.role_id).collect();
    let role_names: HashMap<i64, String> = if role_ids.is_empty() {
        HashMap::new()
    } else {
        role_offer::Entity::find()
            .filter(role_offer::Column::Id.is_in(role_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.id, r.role_name))
            .collect()
    };

    let mut by_user: HashMap<i64, Vec<UserRoleResponse>> = HashMap::new();
    for p in permissions {
        let role_name = role_names.get(&p.role_id).cloned();
        by_user
            .entry(p.user_id)
            .or_default()
            .push(UserRoleResponse::new(p, role_name));
    }

    Ok(users
        .into_iter()
        .map(|u| {
            let roles = by_user.remove(&u.id).unwrap_or_default();
            UserResponse::new(u, roles)
        })
        .collect())
}

/// Resolve requested permissions by role name
async fn resolve_permissions<S>(store: &S, requests: &[UserRoleRequest]) -> AppResult<Vec<PermissionRecord>>
where
    S: ImportStore + ?Sized,
{
    let mut permissions = Vec::with_capacity(requests.len());
    for req in requests {
        let role = store
            .find_role_by_name(&req.role_name)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Role '{}' does not exist", req.role_name.trim())))?;
        permissions.push(PermissionRecord {
            kind: req.kind.trim().to_string(),
            bank: req.bank.trim().to_string(),
            branch: req.branch.trim().to_string(),
            role: RoleRef::from(&role),
            from_date: req.from_date,
            to_date: req.to_date,
        });
    }
    Ok(permissions)
}

async fn load_user(db: &DatabaseConnection, id: i64) -> AppResult<UserResponse> {
    let user = user_offer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_not_found(format!("User {} not found", id))?;
    with_permissions(db, vec![user])
        .await?
        .pop()
        .ok_or_not_found(format!("User {} not found", id))
}

/// GET /api/users - Page of users, newest first
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<PageResponse<UserResponse>>>> {
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(0);

    let mut select = user_offer::Entity::find()
        .order_by_desc(user_offer::Column::CreatedTime)
        .order_by_desc(user_offer::Column::Id);
    if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        select = select.filter(keyword_condition(keyword));
    }

    let paginator = select.paginate(&state.db, size);
    let totals = paginator.num_items_and_pages().await?;
    let users = paginator.fetch_page(page).await?;
    let content = with_permissions(&state.db, users).await?;

    Ok(Json(ApiResponse::success(PageResponse {
        content,
        total_elements: totals.number_of_items,
        total_pages: totals.number_of_pages,
        size,
        number: page,
    })))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    Ok(Json(ApiResponse::success(load_user(&state.db, id).await?)))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut req): Json<UserRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    req.validate(true)?;
    let user_name = req.user_name.trim().to_string();

    let taken = user_offer::Entity::find()
        .filter(user_offer::Column::UserName.eq(user_name.as_str()))
        .count(&state.db)
        .await?
        > 0;
    if taken {
        return Err(AppError::Conflict(format!("Username '{}' already exists", user_name)));
    }

    let store = state.store();
    let permissions = match req.user_roles.as_deref() {
        Some(roles) => resolve_permissions(&store, roles).await?,
        None => Vec::new(),
    };

    let record = UserRecord {
        id: None,
        username: user_name,
        full_name: req.full_name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req.phone,
        birth_day: req.birth_day,
        gender: req.gender.as_deref().and_then(Gender::parse),
        status: UserStatus::Active,
        created_by: Some(ADMIN_ACTOR.to_string()),
        created_time: Some(Local::now().naive_local()),
        updated_by: None,
        updated_time: None,
        permissions,
    };

    let saved = store.save_all(vec![record]).await?;
    let id = saved
        .first()
        .and_then(|u| u.id)
        .ok_or_else(|| AppError::Internal("Created user has no id".to_string()))?;

    tracing::info!("User {} created via API", id);
    Ok(Json(ApiResponse::success(load_user(&state.db, id).await?)))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut req): Json<UserRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    req.validate(false)?;

    let existing = user_offer::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_not_found(format!("User {} not found", id))?;

    let permissions = match req.user_roles.as_deref() {
        Some(roles) => Some(resolve_permissions(&state.store(), roles).await?),
        None => None,
    };

    let txn = state.db.begin().await?;

    let mut model: user_offer::ActiveModel = existing.into();
    model.full_name = Set(req.full_name.trim().to_string());
    model.email = Set(req.email.trim().to_string());
    model.phone = Set(req.phone);
    model.birth_day = Set(req.birth_day);
    model.gender = Set(req
        .gender
        .as_deref()
        .and_then(Gender::parse)
        .map(|g| g.as_str().to_string()));
    if let Some(status) = req.status.as_deref() {
        model.status = Set(UserStatus::from(status).as_str().to_string());
    }
    model.updated_by = Set(Some(ADMIN_ACTOR.to_string()));
    model.updated_time = Set(Some(Local::now().naive_local()));
    model.update(&txn).await?;

    if let Some(permissions) = permissions {
        user_role_offer::Entity::delete_many()
            .filter(user_role_offer::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        for permission in &permissions {
            permission_model(id, permission).insert(&txn).await?;
        }
    }

    txn.commit().await?;

    tracing::info!("User {} updated via API", id);
    Ok(Json(ApiResponse::success(load_user(&state.db, id).await?)))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    user_offer::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_not_found(format!("User {} not found", id))?;

    let txn = state.db.begin().await?;
    user_role_offer::Entity::delete_many()
        .filter(user_role_offer::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    user_offer::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!("User {} deleted via API", id);
    Ok(Json(ApiResponse::success_msg("User deleted")))
}
