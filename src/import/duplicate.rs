//! Duplicate permission detection
//!
//! Two policies apply:
//! - against stored permissions, a conflict needs the same key AND
//!   overlapping date ranges (checked by the store);
//! - within one submission, the same key is a conflict regardless of dates.

use chrono::NaiveDate;

use super::issue::RowError;
use super::record::{PermissionRecord, UserRecord};
use crate::store::{ImportStore, PermissionSpan};

/// Stand-in for an unset from-date
pub fn sentinel_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Stand-in for an unset to-date
pub fn sentinel_to() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Overlap between a stored range (unset bounds are open) and a candidate
/// range whose bounds have already been substituted
pub fn ranges_overlap(
    existing_from: Option<NaiveDate>,
    existing_to: Option<NaiveDate>,
    from: NaiveDate,
    to: NaiveDate,
) -> bool {
    existing_to.map_or(true, |t| t >= from) && existing_from.map_or(true, |f| f <= to)
}

impl<'a> PermissionSpan<'a> {
    pub fn for_candidate(user_id: i64, candidate: &'a PermissionRecord) -> Self {
        Self {
            user_id,
            role_id: candidate.role.id,
            bank: &candidate.bank,
            branch: &candidate.branch,
            kind: &candidate.kind,
            from: candidate.from_date.unwrap_or_else(sentinel_from),
            to: candidate.to_date.unwrap_or_else(sentinel_to),
        }
    }
}

fn describe(candidate: &PermissionRecord) -> String {
    format!(
        "[{} - {} - {} - {}]",
        candidate.role.name, candidate.bank, candidate.branch, candidate.kind
    )
}

/// Reject `candidate` if it conflicts with a stored permission of `user` or
/// with one already accepted for `user` in this run
pub async fn check_duplicate<S>(
    store: &S,
    user: &UserRecord,
    candidate: &PermissionRecord,
) -> Result<(), RowError>
where
    S: ImportStore + ?Sized,
{
    // New users cannot have stored permissions
    if let Some(user_id) = user.id {
        let span = PermissionSpan::for_candidate(user_id, candidate);
        if store.exists_duplicate_permission(&span).await? {
            return Err(RowError::Duplicate(format!(
                "Permission {} already exists for user '{}'",
                describe(candidate),
                user.username
            )));
        }
    }

    let in_batch = user.permissions.iter().any(|p| {
        p.same_key(candidate.role.id, &candidate.bank, &candidate.branch, &candidate.kind)
    });
    if in_batch {
        return Err(RowError::Duplicate(format!(
            "Permission {} is duplicated in file for user '{}'",
            describe(candidate),
            user.username
        )));
    }

    Ok(())
}
