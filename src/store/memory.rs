//! In-memory `ImportStore` for tests
//!
//! Applies the same overlap rule as the SQL query in `sea.rs`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sea_orm::DbErr;

use super::{ImportStore, PermissionSpan};
use crate::import::duplicate::ranges_overlap;
use crate::import::record::{PermissionRecord, RoleRecord, UserRecord};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRecord>>,
    /// (user id, permission)
    permissions: Mutex<Vec<(i64, PermissionRecord)>>,
    roles: Vec<RoleRecord>,
    next_id: AtomicUsize,
    user_lookups: AtomicUsize,
    duplicate_queries: AtomicUsize,
    saves: AtomicUsize,
    fail_duplicate_queries: bool,
}

impl MemoryStore {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1
    }

    pub fn with_user(self, user: UserRecord) -> Self {
        self.insert_user(user, Vec::new());
        self
    }

    pub fn with_role(mut self, name: &str) -> Self {
        let id = self.next_id();
        self.roles.push(RoleRecord {
            id,
            name: name.to_string(),
            status: Some("ACTIVE".to_string()),
            description: None,
        });
        self
    }

    /// Every duplicate query fails with a database error
    pub fn failing_duplicate_queries(mut self) -> Self {
        self.fail_duplicate_queries = true;
        self
    }

    /// Store a user with permissions; returns it as the importer would load it
    pub fn insert_user(&self, mut user: UserRecord, permissions: Vec<PermissionRecord>) -> UserRecord {
        let id = self.next_id();
        user.id = Some(id);
        user.permissions.clear();
        self.permissions
            .lock()
            .unwrap()
            .extend(permissions.into_iter().map(|p| (id, p)));
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn role_id(&self, name: &str) -> Option<i64> {
        self.roles.iter().find(|r| r.name == name).map(|r| r.id)
    }

    pub fn user(&self, username: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn permissions_of(&self, user_id: i64) -> Vec<PermissionRecord> {
        self.permissions
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    pub fn duplicate_queries(&self) -> usize {
        self.duplicate_queries.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImportStore for MemoryStore {
    async fn find_users_by_usernames(
        &self,
        usernames: &HashSet<String>,
    ) -> Result<Vec<UserRecord>, DbErr> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| usernames.contains(&u.username))
            .cloned()
            .collect())
    }

    async fn find_all_roles(&self) -> Result<Vec<RoleRecord>, DbErr> {
        Ok(self.roles.clone())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, DbErr> {
        Ok(self
            .roles
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn exists_duplicate_permission(&self, span: &PermissionSpan<'_>) -> Result<bool, DbErr> {
        self.duplicate_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_duplicate_queries {
            return Err(DbErr::Custom("connection reset".to_string()));
        }
        Ok(self.permissions.lock().unwrap().iter().any(|(owner, p)| {
            *owner == span.user_id
                && p.same_key(span.role_id, span.bank, span.branch, span.kind)
                && ranges_overlap(p.from_date, p.to_date, span.from, span.to)
        }))
    }

    async fn save_all(&self, users: Vec<UserRecord>) -> Result<Vec<UserRecord>, DbErr> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut saved = Vec::with_capacity(users.len());
        for mut user in users {
            let id = match user.id {
                Some(id) => id,
                None => self.insert_user(user.clone(), Vec::new()).id.unwrap_or_default(),
            };
            self.permissions
                .lock()
                .unwrap()
                .extend(user.permissions.iter().cloned().map(|p| (id, p)));
            user.id = Some(id);
            saved.push(user);
        }
        Ok(saved)
    }
}
