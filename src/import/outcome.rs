//! Run summary

use serde::Serialize;

use super::issue::{Severity, ValidationIssue};

/// What the caller gets back from a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// Distinct usernames in the Users sheet plus non-blank Permissions rows
    pub total_rows: usize,
    /// Accepted users, created or reused
    pub success_count: usize,
    /// Error issues only; warnings never count
    pub error_count: usize,
    /// Warnings first, then errors, each in row order
    pub issues: Vec<String>,
    pub message: String,
}

/// Counts gathered by the orchestrator
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounts {
    pub total_rows: usize,
    pub created: usize,
    pub reused: usize,
}

/// Issues collected during a run
#[derive(Debug, Default)]
pub struct IssueLog {
    warnings: Vec<ValidationIssue>,
    errors: Vec<ValidationIssue>,
}

impl IssueLog {
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            Severity::Warning => self.warnings.push(issue),
            Severity::Error => self.errors.push(issue),
        }
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn summarize(self, counts: RunCounts) -> ImportOutcome {
        let message = format!(
            "Created: {} users, Permissions updated: {} users, Warnings: {}",
            counts.created,
            counts.reused,
            self.warnings.len()
        );
        let error_count = self.errors.len();
        let issues = self
            .warnings
            .iter()
            .chain(self.errors.iter())
            .map(ToString::to_string)
            .collect();

        ImportOutcome {
            total_rows: counts.total_rows,
            success_count: counts.created + counts.reused,
            error_count,
            issues,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::issue::SheetKind;

    #[test]
    fn warnings_are_listed_first_and_not_counted_as_errors() {
        let mut log = IssueLog::default();
        log.push(ValidationIssue::error(SheetKind::Users, 4, "Blank email"));
        log.push(ValidationIssue::warning(SheetKind::Users, 5, "Username 'a' already exists"));
        log.push(ValidationIssue::error(SheetKind::Permissions, 4, "Blank bank"));

        let outcome = log.summarize(RunCounts {
            total_rows: 6,
            created: 2,
            reused: 1,
        });

        assert_eq!(outcome.error_count, 2);
        assert_eq!(outcome.success_count, 3);
        assert_eq!(outcome.total_rows, 6);
        assert_eq!(
            outcome.issues,
            vec![
                "Sheet User - Row 5: Username 'a' already exists",
                "Sheet User - Row 4: Blank email",
                "Sheet Permission - Row 4: Blank bank",
            ]
        );
        assert_eq!(
            outcome.message,
            "Created: 2 users, Permissions updated: 1 users, Warnings: 1"
        );
    }

    #[test]
    fn outcome_serializes_camel_case() {
        let outcome = IssueLog::default().summarize(RunCounts::default());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["totalRows"], 0);
        assert_eq!(json["successCount"], 0);
        assert_eq!(json["errorCount"], 0);
        assert!(json["issues"].as_array().unwrap().is_empty());
    }
}
