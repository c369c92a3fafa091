//! Records produced by an import run
//!
//! A `UserRecord` is the aggregate root: it owns its permissions as plain
//! values. The owning user id is only attached when the batch is saved.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Audit actor stamped on users created by the spreadsheet import
pub const IMPORT_ACTOR: &str = "SYSTEM_IMPORT";

/// Gender, as accepted from the spreadsheet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Case-insensitive parse; anything other than MALE/FEMALE is `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

/// User status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
        }
    }
}

impl From<&str> for UserStatus {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("INACTIVE") {
            UserStatus::Inactive
        } else {
            UserStatus::Active
        }
    }
}

/// Role lookup data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
    pub status: Option<String>,
    pub description: Option<String>,
}

/// Reference from a permission to its role
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: i64,
    pub name: String,
}

impl From<&RoleRecord> for RoleRef {
    fn from(role: &RoleRecord) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
        }
    }
}

/// One permission granted to a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub kind: String,
    pub bank: String,
    pub branch: String,
    pub role: RoleRef,
    /// `None` is unbounded towards the past
    pub from_date: Option<NaiveDate>,
    /// `None` is unbounded towards the future
    pub to_date: Option<NaiveDate>,
}

impl PermissionRecord {
    /// Same (role, bank, branch, type) key, dates ignored
    pub fn same_key(&self, role_id: i64, bank: &str, branch: &str, kind: &str) -> bool {
        self.role.id == role_id && self.bank == bank && self.branch == branch && self.kind == kind
    }
}

/// User aggregate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// `None` until the user has been persisted
    pub id: Option<i64>,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_day: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub status: UserStatus,
    pub created_by: Option<String>,
    pub created_time: Option<NaiveDateTime>,
    pub updated_by: Option<String>,
    pub updated_time: Option<NaiveDateTime>,
    /// Permissions added by this run, in row order
    pub permissions: Vec<PermissionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parse_is_case_insensitive() {
        assert_eq!(Gender::parse("male"), Some(Gender::Male));
        assert_eq!(Gender::parse(" Female "), Some(Gender::Female));
        assert_eq!(Gender::parse("other"), None);
        assert_eq!(Gender::parse(""), None);
    }

    #[test]
    fn status_defaults_to_active() {
        assert_eq!(UserStatus::from("inactive"), UserStatus::Inactive);
        assert_eq!(UserStatus::from("ACTIVE"), UserStatus::Active);
        assert_eq!(UserStatus::from(""), UserStatus::Active);
    }
}
