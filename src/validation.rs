//! Task validation rules.
//!
//! Each rule is a pure function returning a [`Verdict`]. Expected bad input
//! never produces an `Err`; callers that need an error (the registry) turn a
//! failed verdict into [`Error::Validation`] with [`Verdict::into_result`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::task::TaskDraft;

/// Weekday tokens accepted in a task's `days`, in calendar order.
pub const VALID_DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

pub const DEFAULT_MAX_TITLE_LEN: usize = 100;
pub const DEFAULT_MIN_DURATION_MINUTES: u32 = 15;

/// Code attached to validation errors raised from a failed task verdict.
pub const TASK_VALIDATION_CODE: &str = "TASK_VALIDATION_FAILED";

/// Code for task input that is not a well-formed task record.
pub const INVALID_TASK_DATA_CODE: &str = "INVALID_TASK_DATA";

// H:MM or HH:MM, 00:00 - 23:59
static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("Invalid time regex pattern")
});

/// Outcome of a validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Convert into a tagged validation error carrying `code`.
    pub fn into_result(self, code: &'static str) -> Result<()> {
        if self.is_valid {
            return Ok(());
        }
        let message = self
            .error
            .unwrap_or_else(|| "invalid task data".to_string());
        Err(Error::validation(code, message))
    }
}

/// Tunable limits for the title and duration rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_title_len: usize,
    pub min_duration_minutes: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_title_len: DEFAULT_MAX_TITLE_LEN,
            min_duration_minutes: DEFAULT_MIN_DURATION_MINUTES,
        }
    }
}

impl ValidationLimits {
    pub fn validate_title(&self, title: &str) -> Verdict {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Verdict::invalid("title required");
        }
        if trimmed.chars().count() > self.max_title_len {
            return Verdict::invalid(format!(
                "title cannot exceed {} characters",
                self.max_title_len
            ));
        }
        Verdict::valid()
    }

    pub fn validate_time_range(&self, start_time: &str, end_time: &str) -> Verdict {
        let start = validate_time(start_time);
        if !start.is_valid {
            return Verdict::invalid(format!(
                "invalid start time: {}",
                start.error.unwrap_or_default()
            ));
        }
        let end = validate_time(end_time);
        if !end.is_valid {
            return Verdict::invalid(format!(
                "invalid end time: {}",
                end.error.unwrap_or_default()
            ));
        }

        // Both matched the regex above.
        let (Some(start_minutes), Some(end_minutes)) =
            (time_to_minutes(start_time), time_to_minutes(end_time))
        else {
            return Verdict::invalid("invalid task data");
        };

        if start_minutes >= end_minutes {
            return Verdict::invalid("start time must be before end time");
        }
        if end_minutes - start_minutes < self.min_duration_minutes {
            return Verdict::invalid(format!(
                "task must last at least {} minutes",
                self.min_duration_minutes
            ));
        }
        Verdict::valid()
    }

    /// Title, then days, then time range; first failure wins.
    pub fn validate_task(&self, draft: &TaskDraft) -> Verdict {
        let title = self.validate_title(&draft.title);
        if !title.is_valid {
            return title;
        }
        let days = validate_days(&draft.days);
        if !days.is_valid {
            return days;
        }
        self.validate_time_range(&draft.start_time, &draft.end_time)
    }

    /// Same rules as [`ValidationLimits::validate_task`] over untyped JSON.
    pub fn validate_task_value(&self, value: &Value) -> Verdict {
        let Some(object) = value.as_object() else {
            return Verdict::invalid("invalid task data");
        };

        let title = match object.get("title").and_then(Value::as_str) {
            Some(title) => self.validate_title(title),
            None => Verdict::invalid("title required"),
        };
        if !title.is_valid {
            return title;
        }

        let days = match object.get("days").and_then(Value::as_array) {
            Some(items) => {
                let tokens: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Value::String(token) => token.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                validate_days(&tokens)
            }
            None => Verdict::invalid("days must be a list"),
        };
        if !days.is_valid {
            return days;
        }

        let start = object.get("startTime").and_then(Value::as_str).unwrap_or("");
        let end = object.get("endTime").and_then(Value::as_str).unwrap_or("");
        self.validate_time_range(start, end)
    }
}

pub fn validate_title(title: &str) -> Verdict {
    ValidationLimits::default().validate_title(title)
}

pub fn validate_days(days: &[String]) -> Verdict {
    if days.is_empty() {
        return Verdict::invalid("select at least one day");
    }
    let invalid: Vec<&str> = days
        .iter()
        .map(String::as_str)
        .filter(|day| !VALID_DAYS.contains(day))
        .collect();
    if !invalid.is_empty() {
        return Verdict::invalid(format!("invalid days: {}", invalid.join(", ")));
    }
    Verdict::valid()
}

pub fn validate_time(time: &str) -> Verdict {
    if time.is_empty() {
        return Verdict::invalid("time required");
    }
    if !TIME_REGEX.is_match(time) {
        return Verdict::invalid("time must use HH:MM format (00:00 - 23:59)");
    }
    Verdict::valid()
}

pub fn validate_time_range(start_time: &str, end_time: &str) -> Verdict {
    ValidationLimits::default().validate_time_range(start_time, end_time)
}

pub fn validate_task(draft: &TaskDraft) -> Verdict {
    ValidationLimits::default().validate_task(draft)
}

pub fn validate_task_value(value: &Value) -> Verdict {
    ValidationLimits::default().validate_task_value(value)
}

/// Split a well-formed `H:MM`/`HH:MM` string into hour and minute.
pub fn parse_time(time: &str) -> Option<(u32, u32)> {
    if !TIME_REGEX.is_match(time) {
        return None;
    }
    let (hour, minute) = time.split_once(':')?;
    Some((hour.parse().ok()?, minute.parse().ok()?))
}

/// Minutes since midnight for a well-formed time string.
pub fn time_to_minutes(time: &str) -> Option<u32> {
    parse_time(time).map(|(hour, minute)| hour * 60 + minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn days(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|day| day.to_string()).collect()
    }

    fn draft(title: &str, day_tokens: &[&str], start: &str, end: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            days: days(day_tokens),
            start_time: start.to_string(),
            end_time: end.to_string(),
            ..TaskDraft::default()
        }
    }

    #[test]
    fn title_accepts_up_to_limit() {
        assert!(validate_title("Gym").is_valid);
        assert!(validate_title(&"a".repeat(100)).is_valid);
        assert!(validate_title("  padded title  ").is_valid);
        assert!(validate_title("Tarea con émojis 🚀 y acentos").is_valid);
    }

    #[test]
    fn title_rejects_empty_and_long() {
        assert_eq!(validate_title(""), Verdict::invalid("title required"));
        assert_eq!(validate_title("   "), Verdict::invalid("title required"));
        assert_eq!(
            validate_title(&"a".repeat(101)),
            Verdict::invalid("title cannot exceed 100 characters")
        );
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        assert!(validate_title(&"é".repeat(100)).is_valid);
        assert!(!validate_title(&"é".repeat(101)).is_valid);
    }

    #[test]
    fn days_accepts_any_non_empty_subset() {
        for mask in 1u32..128 {
            let subset: Vec<String> = VALID_DAYS
                .iter()
                .enumerate()
                .filter(|(idx, _)| mask & (1 << idx) != 0)
                .map(|(_, day)| day.to_string())
                .collect();
            assert!(validate_days(&subset).is_valid, "subset {subset:?}");
        }
        assert!(validate_days(&days(&["monday", "monday", "tuesday"])).is_valid);
    }

    #[test]
    fn days_rejects_empty_and_unknown_tokens() {
        assert_eq!(
            validate_days(&[]),
            Verdict::invalid("select at least one day")
        );
        assert_eq!(
            validate_days(&days(&["lunes"])),
            Verdict::invalid("invalid days: lunes")
        );
        assert_eq!(
            validate_days(&days(&["monday", "invalidDay", "tuesday", "anotherInvalid"])),
            Verdict::invalid("invalid days: invalidDay, anotherInvalid")
        );
        let bad_inputs: [&[&str]; 3] = [&["MONDAY"], &["mon", "tue"], &["1", "2"]];
        for bad in bad_inputs {
            assert!(!validate_days(&days(bad)).is_valid);
        }
    }

    #[test]
    fn time_accepts_full_range() {
        for hour in 0..24 {
            for minute in 0..60 {
                let padded = format!("{hour:02}:{minute:02}");
                assert!(validate_time(&padded).is_valid, "{padded}");
                let short = format!("{hour}:{minute:02}");
                assert!(validate_time(&short).is_valid, "{short}");
            }
        }
    }

    #[test]
    fn time_rejects_malformed() {
        assert_eq!(validate_time(""), Verdict::invalid("time required"));
        for bad in ["24:00", "25:00", "12:60", "12:5", "abc", "12:ab", "99:99", " 9:30"] {
            assert_eq!(
                validate_time(bad),
                Verdict::invalid("time must use HH:MM format (00:00 - 23:59)"),
                "{bad}"
            );
        }
    }

    #[test]
    fn range_enforces_order_and_duration() {
        assert!(validate_time_range("09:00", "17:00").is_valid);
        assert!(validate_time_range("12:00", "12:15").is_valid);
        assert!(validate_time_range("9:45", "10:00").is_valid);

        let before = Verdict::invalid("start time must be before end time");
        assert_eq!(validate_time_range("12:00", "12:00"), before);
        assert_eq!(validate_time_range("18:00", "09:00"), before);
        assert_eq!(validate_time_range("23:00", "01:00"), before);

        assert_eq!(
            validate_time_range("09:00", "09:10"),
            Verdict::invalid("task must last at least 15 minutes")
        );
        assert_eq!(
            validate_time_range("12:00", "12:14"),
            Verdict::invalid("task must last at least 15 minutes")
        );
    }

    #[test]
    fn range_reports_which_endpoint_is_malformed() {
        let start = validate_time_range("25:00", "17:00");
        assert!(start.error.unwrap().starts_with("invalid start time:"));
        let end = validate_time_range("09:00", "25:00");
        assert!(end.error.unwrap().starts_with("invalid end time:"));
    }

    #[test]
    fn range_respects_custom_minimum() {
        let limits = ValidationLimits {
            min_duration_minutes: 30,
            ..ValidationLimits::default()
        };
        assert!(!limits.validate_time_range("10:00", "10:20").is_valid);
        assert!(limits.validate_time_range("10:00", "10:30").is_valid);
    }

    #[test]
    fn task_checks_title_then_days_then_range() {
        let ok = draft("Gym", &["monday", "wednesday"], "07:00", "08:00");
        assert_eq!(validate_task(&ok), Verdict::valid());

        let everything_wrong = draft("", &["lunes"], "09:00", "09:10");
        assert_eq!(
            validate_task(&everything_wrong),
            Verdict::invalid("title required")
        );

        let bad_days = draft("Gym", &["lunes"], "09:00", "09:10");
        assert_eq!(validate_task(&bad_days), Verdict::invalid("invalid days: lunes"));

        let short = draft("Gym", &["monday"], "09:00", "09:10");
        assert_eq!(
            validate_task(&short),
            Verdict::invalid("task must last at least 15 minutes")
        );
    }

    #[test]
    fn task_value_handles_untyped_input() {
        assert_eq!(
            validate_task_value(&json!("not an object")),
            Verdict::invalid("invalid task data")
        );
        assert_eq!(
            validate_task_value(&json!(null)),
            Verdict::invalid("invalid task data")
        );
        assert_eq!(
            validate_task_value(&json!({ "title": 123 })),
            Verdict::invalid("title required")
        );
        assert_eq!(
            validate_task_value(&json!({ "title": "Gym", "days": "monday" })),
            Verdict::invalid("days must be a list")
        );
        assert_eq!(
            validate_task_value(&json!({
                "title": "Gym",
                "days": ["monday"],
                "startTime": "07:00",
                "endTime": 8
            })),
            Verdict::invalid("invalid end time: time required")
        );
        assert!(validate_task_value(&json!({
            "title": "Gym",
            "days": ["monday", "wednesday"],
            "startTime": "07:00",
            "endTime": "08:00"
        }))
        .is_valid);
    }

    #[test]
    fn verdict_serializes_like_the_ui_expects() {
        let value = serde_json::to_value(Verdict::valid()).unwrap();
        assert_eq!(value, json!({ "isValid": true }));
        let value = serde_json::to_value(Verdict::invalid("title required")).unwrap();
        assert_eq!(value, json!({ "isValid": false, "error": "title required" }));
    }

    #[test]
    fn failed_verdict_becomes_validation_error() {
        let err = Verdict::invalid("title required")
            .into_result(TASK_VALIDATION_CODE)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert_eq!(err.code(), TASK_VALIDATION_CODE);
        assert_eq!(err.to_string(), "title required");
        assert!(Verdict::valid().into_result(TASK_VALIDATION_CODE).is_ok());
    }

    #[test]
    fn parse_time_splits_hours_and_minutes() {
        assert_eq!(parse_time("7:05"), Some((7, 5)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(time_to_minutes("01:30"), Some(90));
    }
}
