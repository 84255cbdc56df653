//! Input validation for todo forms.
//!
//! Checks run before anything touches the store, and every failing field is
//! reported at once so a form can show all messages inline.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::types::{NewTodo, TodoPatch};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

/// Form field a validation message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Description,
    DueDate,
    Time,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::DueDate => "dueDate",
            Field::Time => "time",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// Every field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid todo: {}", summarize(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// First message reported for `field`, for inline display.
    pub fn message_for(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Whether `time` is a valid "H:MM"/"HH:MM" time of day.
pub fn is_valid_time(time: &str) -> bool {
    TIME_RE.is_match(time)
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    let len = name.chars().count();
    let message = if name.is_empty() {
        "Todo name is required"
    } else if len < NAME_MIN_CHARS {
        "Todo name must be at least 3 characters"
    } else if len > NAME_MAX_CHARS {
        "Todo name must be less than 100 characters"
    } else {
        return;
    };
    errors.push(FieldError { field: Field::Name, message });
}

fn check_description(description: Option<&str>, errors: &mut Vec<FieldError>) {
    if description.is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_CHARS) {
        errors.push(FieldError {
            field: Field::Description,
            message: "Description must be less than 500 characters",
        });
    }
}

fn check_due_date(due_date: Option<NaiveDate>, today: NaiveDate, errors: &mut Vec<FieldError>) {
    if due_date.is_some_and(|d| d < today) {
        errors.push(FieldError { field: Field::DueDate, message: "Due date must be in the future" });
    }
}

fn check_time(time: Option<&str>, errors: &mut Vec<FieldError>) {
    if time.is_some_and(|t| !is_valid_time(t)) {
        errors.push(FieldError { field: Field::Time, message: "Invalid time format (HH:MM)" });
    }
}

/// Validate a new todo against `today` (the user's local date).
pub fn validate_new(input: &NewTodo, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    check_name(&input.name, &mut errors);
    check_description(input.description.as_deref(), &mut errors);
    check_due_date(input.due_date, today, &mut errors);
    check_time(input.time.as_deref(), &mut errors);
    ValidationErrors(errors).into_result()
}

/// Validate only the fields a patch sets.
pub fn validate_patch(patch: &TodoPatch, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if let Some(name) = &patch.name {
        check_name(name, &mut errors);
    }
    if let Some(description) = &patch.description {
        check_description(description.as_deref(), &mut errors);
    }
    if let Some(due_date) = patch.due_date {
        check_due_date(due_date, today, &mut errors);
    }
    if let Some(time) = &patch.time {
        check_time(time.as_deref(), &mut errors);
    }
    ValidationErrors(errors).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn accepts_minimal_todo() {
        assert!(validate_new(&NewTodo::named("Buy"), today()).is_ok());
    }

    #[test]
    fn name_is_required() {
        let err = validate_new(&NewTodo::named(""), today()).unwrap_err();
        assert_eq!(err.message_for(Field::Name), Some("Todo name is required"));
    }

    #[test]
    fn name_length_is_counted_in_chars() {
        assert!(validate_new(&NewTodo::named("ab"), today()).is_err());
        // three multi-byte chars are still three chars
        assert!(validate_new(&NewTodo::named("äöü"), today()).is_ok());
        assert!(validate_new(&NewTodo::named("x".repeat(100)), today()).is_ok());
        let err = validate_new(&NewTodo::named("x".repeat(101)), today()).unwrap_err();
        assert_eq!(err.message_for(Field::Name), Some("Todo name must be less than 100 characters"));
    }

    #[test]
    fn description_limit() {
        let ok = NewTodo::named("Name").with_description("d".repeat(500));
        assert!(validate_new(&ok, today()).is_ok());
        let bad = NewTodo::named("Name").with_description("d".repeat(501));
        let err = validate_new(&bad, today()).unwrap_err();
        assert!(err.message_for(Field::Description).is_some());
    }

    #[test]
    fn due_date_today_is_allowed_but_past_is_not() {
        let ok = NewTodo::named("Name").with_due_date(today());
        assert!(validate_new(&ok, today()).is_ok());
        let past = NewTodo::named("Name").with_due_date(today().pred_opt().unwrap());
        let err = validate_new(&past, today()).unwrap_err();
        assert_eq!(err.message_for(Field::DueDate), Some("Due date must be in the future"));
    }

    #[test]
    fn time_format() {
        for ok in ["00:00", "9:30", "09:30", "23:59"] {
            assert!(is_valid_time(ok), "{ok}");
        }
        for bad in ["24:00", "12:60", "1230", "12:3", "ab:cd", ""] {
            assert!(!is_valid_time(bad), "{bad}");
        }
    }

    #[test]
    fn reports_every_failing_field() {
        let input = NewTodo {
            name: "x".into(),
            description: Some("d".repeat(600)),
            due_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            time: Some("99:99".into()),
        };
        let err = validate_new(&input, today()).unwrap_err();
        assert_eq!(err.0.len(), 4);
        assert!(err.to_string().starts_with("invalid todo: name:"));
    }

    #[test]
    fn patch_checks_only_present_fields() {
        assert!(validate_patch(&TodoPatch::default().completed(true), today()).is_ok());
        assert!(validate_patch(&TodoPatch::default().time(None), today()).is_ok());
        let err = validate_patch(&TodoPatch::default().name("no"), today()).unwrap_err();
        assert_eq!(err.0.len(), 1);
    }
}
