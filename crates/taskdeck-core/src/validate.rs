//! Field validation and normalization.
//!
//! Validation always runs before any mutation is attempted: a failure here
//! aborts the whole operation with no side effects.

use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::error::{Error, Result, ValidationKind};
use crate::model::{Priority, Status};

/// Parse an RFC 3339 timestamp from caller input.
///
/// # Errors
///
/// Returns a `Validation` error of kind `MalformedTimestamp` when the input
/// is not parseable.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            Error::validation(
                ValidationKind::MalformedTimestamp,
                format!("'{raw}' is not an RFC 3339 timestamp"),
            )
        })
}

/// Check that a required text field is non-blank after trimming.
///
/// # Errors
///
/// Returns a `Validation` error of kind `BlankField` when the value is empty
/// or whitespace-only.
pub fn check_non_blank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(
            ValidationKind::BlankField,
            format!("{field} must not be blank"),
        ));
    }
    Ok(())
}

/// Check that a due date, when present, is strictly later than `now`.
///
/// Absence of a due date is valid.
///
/// # Errors
///
/// Returns a `Validation` error of kind `DueDateNotInFuture` otherwise.
pub fn check_due_date(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<()> {
    match due_date {
        Some(due) if due <= now => Err(Error::validation(
            ValidationKind::DueDateNotInFuture,
            format!("due date {due} must be strictly after {now}"),
        )),
        _ => Ok(()),
    }
}

/// Parse a status string against the closed enumeration.
///
/// # Errors
///
/// Returns a `Validation` error of kind `InvalidEnumValue` for anything
/// outside {TODO, IN_PROGRESS, DONE}.
pub fn parse_status(raw: &str) -> Result<Status> {
    Ok(Status::from_str(raw)?)
}

/// Parse a priority string against the closed enumeration.
///
/// # Errors
///
/// Returns a `Validation` error of kind `InvalidEnumValue` for anything
/// outside {LOW, MEDIUM, HIGH, CRITICAL}.
pub fn parse_priority(raw: &str) -> Result<Priority> {
    Ok(Priority::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::{check_due_date, check_non_blank, parse_priority, parse_status, parse_timestamp};
    use crate::error::{Error, ValidationKind};
    use crate::model::{Priority, Status};
    use chrono::{Duration, Utc};

    fn validation_kind(err: &Error) -> ValidationKind {
        match err {
            Error::Validation { kind, .. } => *kind,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn future_due_date_is_accepted() {
        let now = Utc::now();
        assert!(check_due_date(Some(now + Duration::days(5)), now).is_ok());
        assert!(check_due_date(Some(now + Duration::microseconds(1)), now).is_ok());
    }

    #[test]
    fn absent_due_date_is_accepted() {
        assert!(check_due_date(None, Utc::now()).is_ok());
    }

    #[test]
    fn past_or_present_due_date_is_rejected() {
        let now = Utc::now();

        let at_now = check_due_date(Some(now), now).expect_err("due == now");
        assert_eq!(validation_kind(&at_now), ValidationKind::DueDateNotInFuture);

        let in_past =
            check_due_date(Some(now - Duration::days(1)), now).expect_err("due in past");
        assert_eq!(validation_kind(&in_past), ValidationKind::DueDateNotInFuture);
    }

    #[test]
    fn blank_values_are_rejected_and_named() {
        for raw in ["", "   ", "\t\n"] {
            let err = check_non_blank("title", raw).expect_err("blank value");
            assert_eq!(validation_kind(&err), ValidationKind::BlankField);
            assert!(err.to_string().contains("title"));
        }

        assert!(check_non_blank("title", "ship it").is_ok());
        assert!(check_non_blank("tag name", " Work ").is_ok());
    }

    #[test]
    fn timestamp_parse_accepts_rfc3339() {
        let parsed = parse_timestamp("2030-01-02T03:04:05Z").expect("valid timestamp");
        assert_eq!(parsed.to_rfc3339(), "2030-01-02T03:04:05+00:00");

        let offset = parse_timestamp(" 2030-01-02T03:04:05+09:00 ").expect("offset timestamp");
        assert_eq!(offset.to_rfc3339(), "2030-01-01T18:04:05+00:00");
    }

    #[test]
    fn timestamp_parse_rejects_garbage() {
        for raw in ["next tuesday", "2030-13-40", "", "1700000000"] {
            let err = parse_timestamp(raw).expect_err("malformed timestamp");
            assert_eq!(validation_kind(&err), ValidationKind::MalformedTimestamp);
        }
    }

    #[test]
    fn enum_parsing_goes_through_validation_errors() {
        assert_eq!(parse_status("todo").expect("status"), Status::Todo);
        assert_eq!(
            parse_priority("CRITICAL").expect("priority"),
            Priority::Critical
        );

        let err = parse_status("WONTFIX").expect_err("bad status");
        assert_eq!(validation_kind(&err), ValidationKind::InvalidEnumValue);

        let err = parse_priority("URGENT").expect_err("bad priority");
        assert_eq!(validation_kind(&err), ValidationKind::InvalidEnumValue);
    }
}
