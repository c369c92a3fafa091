//! Users sheet rows
//!
//! Columns: username, email, full name, birth date, gender, phone, department.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::index::AcceptedUsers;
use super::issue::{finish, RowError};
use super::record::{Gender, UserRecord, UserStatus, IMPORT_ACTOR};
use super::sheet::Sheet;

pub const COL_USERNAME: u32 = 0;
pub const COL_EMAIL: u32 = 1;
pub const COL_FULL_NAME: u32 = 2;
pub const COL_BIRTH_DAY: u32 = 3;
pub const COL_GENDER: u32 = 4;
pub const COL_PHONE: u32 = 5;
pub const COL_DEPARTMENT: u32 = 6;

pub const EMAIL_DOMAIN: &str = "msb.com.vn";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._]+@msb\.com\.vn$").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0[0-9]{9}$").unwrap());

static BARE_PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{9}$").unwrap());

/// Raw cells of one Users row
#[derive(Debug, Clone)]
pub struct UserRow {
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Parsed lazily: only consulted once every field rule has passed
    pub birth_day: Result<Option<NaiveDate>, RowError>,
    pub gender: String,
    pub phone: String,
    pub department: String,
}

impl UserRow {
    pub fn extract(sheet: &Sheet, row: u32) -> Self {
        Self {
            username: sheet.text(row, COL_USERNAME),
            email: sheet.text(row, COL_EMAIL),
            full_name: sheet.text(row, COL_FULL_NAME),
            birth_day: sheet.date(row, COL_BIRTH_DAY),
            gender: sheet.text(row, COL_GENDER),
            phone: sheet.text(row, COL_PHONE),
            department: sheet.text(row, COL_DEPARTMENT),
        }
    }
}

/// Strip whitespace, pad a bare 9-digit number with a leading zero, and
/// require `0` followed by nine digits
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut phone: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if BARE_PHONE_RE.is_match(&phone) {
        phone.insert(0, '0');
    }
    PHONE_RE.is_match(&phone).then_some(phone)
}

/// Address in the bank's mail domain
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn email_prefix(email: &str) -> &str {
    email.split('@').next().unwrap_or_default()
}

/// Validate a new user row; every rule is evaluated before failing
pub fn validate_user(
    row: UserRow,
    accepted: &AcceptedUsers,
    now: NaiveDateTime,
) -> Result<UserRecord, RowError> {
    let mut violations = Vec::new();

    if row.username.is_empty() {
        violations.push("Blank username".to_string());
    } else if accepted.contains(&row.username) {
        violations.push(format!("Username '{}' is duplicated in file", row.username));
    }

    let email_valid = if row.email.is_empty() {
        violations.push("Blank email".to_string());
        false
    } else if !is_valid_email(&row.email) {
        violations.push(format!("Invalid email format (@{})", EMAIL_DOMAIN));
        false
    } else {
        true
    };

    if email_valid && !row.username.is_empty() {
        let prefix = email_prefix(&row.email);
        if row.username != prefix {
            violations.push(format!(
                "Username ({}) does not match email prefix ({})",
                row.username, prefix
            ));
        }
    }

    if row.full_name.is_empty() {
        violations.push("Blank full name".to_string());
    }

    // Unknown values are dropped, not rejected
    let gender = Gender::parse(&row.gender);

    let phone = if row.phone.is_empty() {
        None
    } else {
        let normalized = normalize_phone(&row.phone);
        if normalized.is_none() {
            violations.push("Invalid phone number".to_string());
        }
        normalized
    };

    // Required by the template, not stored
    if row.department.is_empty() {
        violations.push("Blank department".to_string());
    }

    let record = finish(violations, || UserRecord {
        id: None,
        username: row.username,
        full_name: row.full_name,
        email: row.email,
        phone,
        birth_day: None,
        gender,
        status: UserStatus::Active,
        created_by: Some(IMPORT_ACTOR.to_string()),
        created_time: Some(now),
        updated_by: None,
        updated_time: None,
        permissions: Vec::new(),
    })?;

    Ok(UserRecord {
        birth_day: row.birth_day?,
        ..record
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::sheet::test_sheet;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn row(cells: &[&str]) -> UserRow {
        UserRow::extract(&test_sheet(&[cells]), 3)
    }

    fn violations(result: Result<UserRecord, RowError>) -> Vec<String> {
        match result {
            Err(RowError::Invalid(v)) => v,
            other => panic!("expected invalid row, got {:?}", other),
        }
    }

    #[test]
    fn accepts_complete_row_and_normalizes_phone() {
        let record = validate_user(
            row(&["jdoe", "jdoe@msb.com.vn", "John Doe", "", "MALE", "987654321", "Retail"]),
            &AcceptedUsers::default(),
            now(),
        )
        .unwrap();

        assert_eq!(record.username, "jdoe");
        assert_eq!(record.phone.as_deref(), Some("0987654321"));
        assert_eq!(record.gender, Some(Gender::Male));
        assert_eq!(record.birth_day, None);
        assert_eq!(record.status, UserStatus::Active);
        assert_eq!(record.created_by.as_deref(), Some(IMPORT_ACTOR));
        assert_eq!(record.created_time, Some(now()));
        assert!(record.id.is_none());
    }

    #[test]
    fn blank_username_is_rejected() {
        let errors = violations(validate_user(
            row(&["", "jdoe@msb.com.vn", "John Doe", "", "", "", "Retail"]),
            &AcceptedUsers::default(),
            now(),
        ));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_lowercase().contains("blank username"));
    }

    #[test]
    fn username_must_match_email_prefix() {
        let errors = violations(validate_user(
            row(&["johndoe", "jdoe@msb.com.vn", "John Doe", "", "", "", "Retail"]),
            &AcceptedUsers::default(),
            now(),
        ));
        assert_eq!(errors, vec!["Username (johndoe) does not match email prefix (jdoe)"]);
    }

    #[test]
    fn prefix_is_not_checked_for_invalid_email() {
        let errors = violations(validate_user(
            row(&["jdoe", "jdoe@gmail.com", "John Doe", "", "", "", "Retail"]),
            &AcceptedUsers::default(),
            now(),
        ));
        assert_eq!(errors, vec!["Invalid email format (@msb.com.vn)"]);
    }

    #[test]
    fn collects_every_violation_in_rule_order() {
        let errors = violations(validate_user(
            row(&["", "", "", "", "unknown", "12ab", ""]),
            &AcceptedUsers::default(),
            now(),
        ));
        assert_eq!(
            errors,
            vec![
                "Blank username",
                "Blank email",
                "Blank full name",
                "Invalid phone number",
                "Blank department",
            ]
        );
    }

    #[test]
    fn username_already_accepted_in_run_is_duplicate() {
        let mut accepted = AcceptedUsers::default();
        let first = validate_user(
            row(&["jdoe", "jdoe@msb.com.vn", "John Doe", "", "", "", "Retail"]),
            &accepted,
            now(),
        )
        .unwrap();
        accepted.create(first);

        let errors = violations(validate_user(
            row(&["jdoe", "jdoe@msb.com.vn", "John Doe", "", "", "", "Retail"]),
            &accepted,
            now(),
        ));
        assert_eq!(errors, vec!["Username 'jdoe' is duplicated in file"]);
    }

    #[test]
    fn unknown_gender_is_dropped_silently() {
        let record = validate_user(
            row(&["jdoe", "jdoe@msb.com.vn", "John Doe", "", "x", "", "Retail"]),
            &AcceptedUsers::default(),
            now(),
        )
        .unwrap();
        assert_eq!(record.gender, None);
        assert_eq!(record.phone, None);
    }

    #[test]
    fn birth_day_is_parsed_after_field_rules() {
        let record = validate_user(
            row(&["jdoe", "jdoe@msb.com.vn", "John Doe", "02/01/1990", "female", "", "Retail"]),
            &AcceptedUsers::default(),
            now(),
        )
        .unwrap();
        assert_eq!(record.birth_day, NaiveDate::from_ymd_opt(1990, 1, 2));
        assert_eq!(record.gender, Some(Gender::Female));

        let bad_date = validate_user(
            row(&["jdoe", "jdoe@msb.com.vn", "John Doe", "1990-01-02", "", "", "Retail"]),
            &AcceptedUsers::default(),
            now(),
        );
        assert_eq!(bad_date, Err(RowError::DateFormat));

        // Field violations win over a bad date
        let errors = violations(validate_user(
            row(&["jdoe", "jdoe@msb.com.vn", "", "1990-01-02", "", "", "Retail"]),
            &AcceptedUsers::default(),
            now(),
        ));
        assert_eq!(errors, vec!["Blank full name"]);
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("987654321").as_deref(), Some("0987654321"));
        assert_eq!(normalize_phone("0987 654 321").as_deref(), Some("0987654321"));
        assert_eq!(normalize_phone("1987654321"), None);
        assert_eq!(normalize_phone("98765432"), None);
        assert_eq!(normalize_phone("+84987654321"), None);
    }

    #[test]
    fn phone_normalization_is_idempotent() {
        for raw in ["987654321", "0912345678", " 0 9 1 2 3 4 5 6 7 8 "] {
            let once = normalize_phone(raw).unwrap();
            assert_eq!(normalize_phone(&once).as_deref(), Some(once.as_str()));
        }
    }
}
