//! Run-scoped lookup structures
//!
//! `ExistingRecordIndex` is built once per run from the store and never
//! changes afterwards. `AcceptedUsers` grows while the Users sheet is scanned
//! and collects permissions while the Permissions sheet is scanned.

use std::collections::{HashMap, HashSet};

use super::record::{RoleRecord, UserRecord};
use super::sheet::Sheet;
use super::user_row::COL_USERNAME;
use crate::store::ImportStore;

/// Persisted users and roles relevant to one run
#[derive(Debug, Default)]
pub struct ExistingRecordIndex {
    users: HashMap<String, UserRecord>,
    /// Keyed by upper-cased role name
    roles: HashMap<String, RoleRecord>,
    usernames_in_file: usize,
}

impl ExistingRecordIndex {
    /// One batch query for every username in the Users sheet, one role prefetch
    pub async fn build<S>(store: &S, users_sheet: &Sheet) -> Result<Self, sea_orm::DbErr>
    where
        S: ImportStore + ?Sized,
    {
        let usernames = collect_usernames(users_sheet);
        let lookup: HashSet<String> = usernames.iter().filter(|u| !u.is_empty()).cloned().collect();

        let users = if lookup.is_empty() {
            Vec::new()
        } else {
            store.find_users_by_usernames(&lookup).await?
        };
        let roles = store.find_all_roles().await?;

        tracing::debug!(
            "Existing record index: {} usernames in file, {} already stored, {} roles",
            usernames.len(),
            users.len(),
            roles.len()
        );

        Ok(Self::from_parts(usernames.len(), users, roles))
    }

    pub fn from_parts(usernames_in_file: usize, users: Vec<UserRecord>, roles: Vec<RoleRecord>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.username.clone(), u)).collect(),
            roles: roles.into_iter().map(|r| (r.name.to_uppercase(), r)).collect(),
            usernames_in_file,
        }
    }

    pub fn existing_user(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    /// Case-insensitive role lookup
    pub fn role(&self, name: &str) -> Option<&RoleRecord> {
        self.roles.get(&name.to_uppercase())
    }

    /// Distinct usernames over the non-blank Users rows; a blank username
    /// counts once
    pub fn usernames_in_file(&self) -> usize {
        self.usernames_in_file
    }
}

fn collect_usernames(sheet: &Sheet) -> HashSet<String> {
    sheet
        .data_rows()
        .filter(|&row| !sheet.is_row_blank(row))
        .map(|row| sheet.text(row, COL_USERNAME))
        .collect()
}

/// Users accepted by this run, in acceptance order
#[derive(Debug, Default)]
pub struct AcceptedUsers {
    users: Vec<UserRecord>,
    positions: HashMap<String, usize>,
    created: usize,
}

impl AcceptedUsers {
    pub fn contains(&self, username: &str) -> bool {
        self.positions.contains_key(username)
    }

    pub fn position(&self, username: &str) -> Option<usize> {
        self.positions.get(username).copied()
    }

    pub fn get(&self, position: usize) -> Option<&UserRecord> {
        self.users.get(position)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut UserRecord> {
        self.users.get_mut(position)
    }

    /// Bind a stored user; a second occurrence keeps the first binding
    pub fn reuse(&mut self, user: UserRecord) {
        if !self.contains(&user.username) {
            self.push(user);
        }
    }

    /// Add a user created from the spreadsheet
    pub fn create(&mut self, user: UserRecord) {
        self.created += 1;
        self.push(user);
    }

    fn push(&mut self, user: UserRecord) {
        self.positions.insert(user.username.clone(), self.users.len());
        self.users.push(user);
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn reused(&self) -> usize {
        self.users.len() - self.created
    }

    pub fn into_vec(self) -> Vec<UserRecord> {
        self.users
    }
}
