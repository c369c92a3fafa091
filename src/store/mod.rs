//! Persistence collaborator of the importer
//!
//! The engine only talks to storage through `ImportStore`. `SeaOrmStore` is
//! the database implementation used by the service.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DbErr;

use crate::import::record::{RoleRecord, UserRecord};

pub mod sea;

#[cfg(test)]
pub mod memory;

pub use sea::SeaOrmStore;

/// Parameters of the stored-duplicate query; bounds are already substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSpan<'a> {
    pub user_id: i64,
    pub role_id: i64,
    pub bank: &'a str,
    pub branch: &'a str,
    pub kind: &'a str,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[async_trait]
pub trait ImportStore: Send + Sync {
    /// Stored users whose username is in `usernames`, without permissions
    async fn find_users_by_usernames(
        &self,
        usernames: &HashSet<String>,
    ) -> Result<Vec<UserRecord>, DbErr>;

    /// Full role table
    async fn find_all_roles(&self) -> Result<Vec<RoleRecord>, DbErr>;

    /// Case-insensitive role lookup
    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, DbErr>;

    /// Whether the user already holds a permission with the same
    /// (role, bank, branch, type) whose dates overlap `[from, to]`
    async fn exists_duplicate_permission(
        &self,
        span: &PermissionSpan<'_>,
    ) -> Result<bool, DbErr>;

    /// Persist new users and every permission attached in this run; returns
    /// the users with identifiers assigned
    async fn save_all(&self, users: Vec<UserRecord>) -> Result<Vec<UserRecord>, DbErr>;
}
