//! Permissions sheet rows
//!
//! Columns: username, bank, branch, role name, type, from date, to date.

use chrono::NaiveDate;

use super::duplicate::check_duplicate;
use super::index::{AcceptedUsers, ExistingRecordIndex};
use super::issue::RowError;
use super::record::{PermissionRecord, RoleRef};
use super::sheet::Sheet;
use crate::store::ImportStore;

pub const COL_USERNAME: u32 = 0;
pub const COL_BANK: u32 = 1;
pub const COL_BRANCH: u32 = 2;
pub const COL_ROLE: u32 = 3;
pub const COL_TYPE: u32 = 4;
pub const COL_FROM_DATE: u32 = 5;
pub const COL_TO_DATE: u32 = 6;

/// Raw cells of one Permissions row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRow {
    pub username: String,
    pub bank: String,
    pub branch: String,
    pub role_name: String,
    pub kind: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl PermissionRow {
    /// Dates are read up front; a malformed date rejects the row on its own
    pub fn extract(sheet: &Sheet, row: u32) -> Result<Self, RowError> {
        let from_date = sheet.date(row, COL_FROM_DATE)?;
        let to_date = sheet.date(row, COL_TO_DATE)?;
        Ok(Self {
            username: sheet.text(row, COL_USERNAME),
            bank: sheet.text(row, COL_BANK),
            branch: sheet.text(row, COL_BRANCH),
            role_name: sheet.text(row, COL_ROLE),
            kind: sheet.text(row, COL_TYPE),
            from_date,
            to_date,
        })
    }
}

/// Validate a permission row and attach it to its user.
///
/// Field rules are all collected first. Only when both the user and the role
/// resolve is the duplicate check run, and a duplicate rejects the row alone.
pub async fn validate_permission<S>(
    row: PermissionRow,
    accepted: &mut AcceptedUsers,
    index: &ExistingRecordIndex,
    store: &S,
) -> Result<(), RowError>
where
    S: ImportStore + ?Sized,
{
    let mut violations = Vec::new();

    let position = if row.username.is_empty() {
        violations.push("Blank username".to_string());
        None
    } else {
        let position = accepted.position(&row.username);
        if position.is_none() {
            violations.push(format!("Username '{}' not found in file", row.username));
        }
        position
    };

    if row.bank.is_empty() {
        violations.push("Blank bank".to_string());
    }
    if row.branch.is_empty() {
        violations.push("Blank branch".to_string());
    }

    let role = if row.role_name.is_empty() {
        violations.push("Blank role".to_string());
        None
    } else {
        let role = index.role(&row.role_name);
        if role.is_none() {
            violations.push(format!("Role '{}' does not exist", row.role_name));
        }
        role
    };

    let (Some(position), Some(role), true) = (position, role, violations.is_empty()) else {
        return Err(RowError::Invalid(violations));
    };

    let candidate = PermissionRecord {
        kind: row.kind,
        bank: row.bank,
        branch: row.branch,
        role: RoleRef::from(role),
        from_date: row.from_date,
        to_date: row.to_date,
    };

    let user = accepted
        .get(position)
        .ok_or_else(|| RowError::Unexpected(format!("accepted user '{}' missing", row.username)))?;
    check_duplicate(store, user, &candidate).await?;

    if let Some(user) = accepted.get_mut(position) {
        user.permissions.push(candidate);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::record::{RoleRecord, UserRecord, UserStatus};
    use crate::import::sheet::test_sheet;
    use crate::store::memory::MemoryStore;

    fn user(id: Option<i64>, username: &str) -> UserRecord {
        UserRecord {
            id,
            username: username.to_string(),
            full_name: "Someone".to_string(),
            email: format!("{}@msb.com.vn", username),
            phone: None,
            birth_day: None,
            gender: None,
            status: UserStatus::Active,
            created_by: None,
            created_time: None,
            updated_by: None,
            updated_time: None,
            permissions: Vec::new(),
        }
    }

    fn index() -> ExistingRecordIndex {
        let role = RoleRecord {
            id: 3,
            name: "Rm".to_string(),
            status: Some("ACTIVE".to_string()),
            description: None,
        };
        ExistingRecordIndex::from_parts(0, Vec::new(), vec![role])
    }

    fn row(cells: &[&str]) -> Result<PermissionRow, RowError> {
        PermissionRow::extract(&test_sheet(&[cells]), 3)
    }

    #[test]
    fn extract_reads_dates() {
        let parsed = row(&["jdoe", "Retail", "HN01", "RM", "MAIN", "01/01/2020", ""]).unwrap();
        assert_eq!(parsed.from_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(parsed.to_date, None);
        assert_eq!(parsed.kind, "MAIN");
    }

    #[test]
    fn malformed_date_rejects_row() {
        let parsed = row(&["jdoe", "Retail", "HN01", "RM", "MAIN", "", "31-12-2020"]);
        assert_eq!(parsed, Err(RowError::DateFormat));
    }

    #[tokio::test]
    async fn attaches_permission_with_case_insensitive_role() {
        let store = MemoryStore::default();
        let mut accepted = AcceptedUsers::default();
        accepted.create(user(None, "jdoe"));

        let parsed = row(&["jdoe", "Retail", "HN01", "RM", "MAIN", "", ""]).unwrap();
        validate_permission(parsed, &mut accepted, &index(), &store)
            .await
            .unwrap();

        let owner = accepted.get(0).unwrap();
        assert_eq!(owner.permissions.len(), 1);
        assert_eq!(owner.permissions[0].role.id, 3);
        assert_eq!(owner.permissions[0].role.name, "Rm");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found_in_file() {
        let store = MemoryStore::default();
        let mut accepted = AcceptedUsers::default();

        let parsed = row(&["ghost", "Retail", "HN01", "RM", "", "", ""]).unwrap();
        let err = validate_permission(parsed, &mut accepted, &index(), &store)
            .await
            .unwrap_err();
        assert_eq!(err, RowError::Invalid(vec!["Username 'ghost' not found in file".to_string()]));
    }

    #[tokio::test]
    async fn collects_all_field_violations() {
        let store = MemoryStore::default();
        let mut accepted = AcceptedUsers::default();
        accepted.create(user(None, "jdoe"));

        let parsed = row(&["jdoe", "", "", "ADMIN", "", "", ""]).unwrap();
        let err = validate_permission(parsed, &mut accepted, &index(), &store)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Blank bank; Blank branch; Role 'ADMIN' does not exist");

        let parsed = row(&["", "Retail", "HN01", "", "", "", ""]).unwrap();
        let err = validate_permission(parsed, &mut accepted, &index(), &store)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Blank username; Blank role");
        assert!(accepted.get(0).unwrap().permissions.is_empty());
    }

    #[tokio::test]
    async fn second_identical_row_is_in_batch_duplicate() {
        let store = MemoryStore::default();
        let mut accepted = AcceptedUsers::default();
        accepted.reuse(store.insert_user(user(None, "jdoe"), Vec::new()));

        let first = row(&["jdoe", "Retail", "HN01", "RM", "MAIN", "01/01/2020", "31/12/2021"]).unwrap();
        let second = row(&["jdoe", "Retail", "HN01", "rm", "MAIN", "01/01/2022", "31/12/2023"]).unwrap();

        validate_permission(first, &mut accepted, &index(), &store)
            .await
            .unwrap();
        let err = validate_permission(second, &mut accepted, &index(), &store)
            .await
            .unwrap_err();

        assert!(matches!(err, RowError::Duplicate(ref m) if m.contains("duplicated in file")));
        assert_eq!(accepted.get(0).unwrap().permissions.len(), 1);
        assert_eq!(store.duplicate_queries(), 2);
    }
}
