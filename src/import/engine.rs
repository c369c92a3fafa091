//! Import orchestration
//!
//! A run opens the workbook, builds the existing-record index, scans the
//! Users sheet to completion, then scans the Permissions sheet, summarizes
//! and saves. Only opening, indexing and the final save can fail the run;
//! every row problem becomes an issue and the scan moves on.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info, warn};

use super::error::ImportError;
use super::index::{AcceptedUsers, ExistingRecordIndex};
use super::issue::{SheetKind, ValidationIssue};
use super::outcome::{ImportOutcome, IssueLog, RunCounts};
use super::permission_row::{validate_permission, PermissionRow};
use super::sheet::{Sheet, Workbook};
use super::user_row::{validate_user, UserRow, COL_USERNAME};
use crate::config::ImportConfig;
use crate::store::ImportStore;

/// Spreadsheet importer. Holds no run state, so one instance serves any
/// number of runs.
#[derive(Debug, Clone)]
pub struct UserImporter {
    config: ImportConfig,
}

impl UserImporter {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Import an uploaded file
    pub async fn import_file<S>(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        store: &S,
    ) -> Result<ImportOutcome, ImportError>
    where
        S: ImportStore + ?Sized,
    {
        info!("Importing users from {} ({} bytes)", file_name, bytes.len());
        let workbook = Workbook::open(file_name, bytes, &self.config).map_err(|e| {
            error!("Rejected import file {}: {}", file_name, e);
            e
        })?;
        self.import_workbook(&workbook, store).await
    }

    /// Import an already opened workbook
    pub async fn import_workbook<S>(
        &self,
        workbook: &Workbook,
        store: &S,
    ) -> Result<ImportOutcome, ImportError>
    where
        S: ImportStore + ?Sized,
    {
        let index = ExistingRecordIndex::build(store, &workbook.users).await?;
        let mut accepted = AcceptedUsers::default();
        let mut issues = IssueLog::default();

        scan_users(
            &workbook.users,
            &index,
            &mut accepted,
            &mut issues,
            Local::now().naive_local(),
        );
        scan_permissions(&workbook.permissions, &index, &mut accepted, &mut issues, store).await;

        // Every Permissions row below the header counts, blank or not
        let counts = RunCounts {
            total_rows: index.usernames_in_file() + workbook.permissions.data_rows().len(),
            created: accepted.created(),
            reused: accepted.reused(),
        };
        info!(
            "Import scanned {} rows: {} users created, {} reused, {} warnings, {} errors",
            counts.total_rows,
            counts.created,
            counts.reused,
            issues.warning_count(),
            issues.error_count()
        );
        let outcome = issues.summarize(counts);

        if !accepted.is_empty() {
            store.save_all(accepted.into_vec()).await?;
        }

        Ok(outcome)
    }
}

fn scan_users(
    sheet: &Sheet,
    index: &ExistingRecordIndex,
    accepted: &mut AcceptedUsers,
    issues: &mut IssueLog,
    now: NaiveDateTime,
) {
    for row in sheet.data_rows() {
        if sheet.is_row_blank(row) {
            continue;
        }
        let line = row + 1;
        let username = sheet.text(row, COL_USERNAME);

        if let Some(existing) = index.existing_user(&username) {
            issues.push(ValidationIssue::warning(
                SheetKind::Users,
                line,
                format!(
                    "Username '{}' already exists (permissions will be added if any)",
                    username
                ),
            ));
            accepted.reuse(existing.clone());
            continue;
        }

        match validate_user(UserRow::extract(sheet, row), accepted, now) {
            Ok(user) => {
                debug!("Users row {}: accepted {}", line, user.username);
                accepted.create(user);
            }
            Err(e) => {
                warn!("Users row {} rejected: {}", line, e);
                issues.push(ValidationIssue::error(SheetKind::Users, line, e.to_string()));
            }
        }
    }
}

async fn scan_permissions<S>(
    sheet: &Sheet,
    index: &ExistingRecordIndex,
    accepted: &mut AcceptedUsers,
    issues: &mut IssueLog,
    store: &S,
) where
    S: ImportStore + ?Sized,
{
    for row in sheet.data_rows() {
        if sheet.is_row_blank(row) {
            continue;
        }
        let line = row + 1;

        let result = match PermissionRow::extract(sheet, row) {
            Ok(parsed) => validate_permission(parsed, accepted, index, store).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => debug!("Permissions row {}: accepted", line),
            Err(e) => {
                warn!("Permissions row {} rejected: {}", line, e);
                issues.push(ValidationIssue::error(SheetKind::Permissions, line, e.to_string()));
            }
        }
    }
}
