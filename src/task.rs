//! Task records.
//!
//! The whole collection is persisted as one JSON array; field names follow
//! the stored blob (`startTime`, `notificationsEnabled`, `user`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

/// Completion state of a task. Toggling walks the cycle
/// `undefined -> in-progress -> completed -> undefined`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Undefined,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn next(self) -> Self {
        match self {
            TaskStatus::Undefined => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Undefined,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, TaskStatus::Undefined)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Undefined => "undefined",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "undefined" | "none" => Ok(TaskStatus::Undefined),
            "in-progress" | "in_progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            other => Err(Error::InvalidArgument(format!(
                "unknown task status '{other}' (expected undefined|in-progress|completed)"
            ))),
        }
    }
}

// Older blobs store `"status": null` for undefined.
fn deserialize_status<'de, D>(deserializer: D) -> std::result::Result<TaskStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TaskStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// A valid weekday token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = Error;

    /// Tokens are case-sensitive, matching the stored format.
    fn from_str(s: &str) -> Result<Self> {
        Weekday::ALL
            .into_iter()
            .find(|day| day.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown weekday '{s}'")))
    }
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub days: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "user")]
    pub owner: String,
    #[serde(
        default,
        skip_serializing_if = "TaskStatus::is_undefined",
        deserialize_with = "deserialize_status"
    )]
    pub status: TaskStatus,
    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,
}

fn default_notifications_enabled() -> bool {
    true
}

impl Task {
    /// Build a task from a draft, filling in the id when the draft has none.
    pub fn from_draft(draft: TaskDraft) -> Self {
        let id = draft
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_task_id);
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            days: draft.days,
            start_time: draft.start_time,
            end_time: draft.end_time,
            owner: draft.owner,
            status: draft.status,
            notifications_enabled: draft.notifications_enabled.unwrap_or(true),
        }
    }

    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            id: Some(self.id.clone()),
            title: self.title.clone(),
            description: self.description.clone(),
            days: self.days.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            owner: self.owner.clone(),
            status: self.status,
            notifications_enabled: Some(self.notifications_enabled),
        }
    }

    /// Recognised weekdays, deduplicated, in the order they were selected.
    pub fn weekdays(&self) -> Vec<Weekday> {
        let mut seen = Vec::new();
        for token in &self.days {
            if let Ok(day) = token.parse::<Weekday>() {
                if !seen.contains(&day) {
                    seen.push(day);
                }
            }
        }
        seen
    }

    pub fn runs_on(&self, day: Weekday) -> bool {
        self.days.iter().any(|token| token == day.as_str())
    }
}

/// Candidate task as entered by the user, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDraft {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub days: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(alias = "user")]
    pub owner: String,
    #[serde(deserialize_with = "deserialize_status")]
    pub status: TaskStatus,
    pub notifications_enabled: Option<bool>,
}

pub fn generate_task_id() -> String {
    Ulid::new().to_string().to_ascii_lowercase()
}

/// Status filter of the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    InProgress,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.status == TaskStatus::Completed,
            StatusFilter::InProgress => task.status == TaskStatus::InProgress,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "in-progress" | "in_progress" => Ok(StatusFilter::InProgress),
            other => Err(Error::InvalidArgument(format!(
                "unknown status filter '{other}' (expected all|completed|in-progress)"
            ))),
        }
    }
}

/// Weekday filter of the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayFilter {
    #[default]
    All,
    Day(Weekday),
}

impl DayFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            DayFilter::All => true,
            DayFilter::Day(day) => task.runs_on(*day),
        }
    }
}

impl FromStr for DayFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(DayFilter::All);
        }
        Ok(DayFilter::Day(trimmed.to_ascii_lowercase().parse()?))
    }
}

/// Per-status totals shown next to the filter tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub all: usize,
    pub completed: usize,
    pub in_progress: usize,
}

impl TaskCounts {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = TaskCounts::default();
        for task in tasks {
            counts.all += 1;
            match task.status {
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Undefined => {}
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Task {
        Task {
            id: "T1".to_string(),
            title: "Gym".to_string(),
            description: String::new(),
            days: vec!["monday".to_string(), "wednesday".to_string()],
            start_time: "07:00".to_string(),
            end_time: "08:00".to_string(),
            owner: "ana".to_string(),
            status: TaskStatus::Undefined,
            notifications_enabled: true,
        }
    }

    #[test]
    fn status_cycles_through_three_states() {
        let mut status = TaskStatus::Undefined;
        let mut seen = Vec::new();
        for _ in 0..3 {
            status = status.next();
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                TaskStatus::InProgress,
                TaskStatus::Completed,
                TaskStatus::Undefined
            ]
        );
    }

    #[test]
    fn serializes_with_stored_field_names() {
        let mut task = sample();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["startTime"], "07:00");
        assert_eq!(value["user"], "ana");
        assert_eq!(value["notificationsEnabled"], true);
        assert!(value.get("status").is_none());

        task.status = TaskStatus::InProgress;
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["status"], "in-progress");
    }

    #[test]
    fn deserializes_legacy_blob() {
        let value = json!({
            "id": "1700000000000",
            "title": "Read",
            "days": ["friday"],
            "startTime": "21:00",
            "endTime": "22:00",
            "user": "ana",
            "status": null
        });
        let task: Task = serde_json::from_value(value).unwrap();
        assert_eq!(task.status, TaskStatus::Undefined);
        assert!(task.notifications_enabled);
        assert_eq!(task.description, "");
    }

    #[test]
    fn from_draft_assigns_id_and_defaults() {
        let draft = TaskDraft {
            title: "  Gym ".to_string(),
            days: vec!["monday".to_string()],
            start_time: "07:00".to_string(),
            end_time: "08:00".to_string(),
            owner: "ana".to_string(),
            ..TaskDraft::default()
        };
        let task = Task::from_draft(draft);
        assert!(!task.id.is_empty());
        assert_eq!(task.title, "Gym");
        assert!(task.notifications_enabled);

        let again = Task::from_draft(task.to_draft());
        assert_eq!(again, task);
    }

    #[test]
    fn weekdays_skips_unknown_and_duplicates() {
        let mut task = sample();
        task.days = vec![
            "friday".to_string(),
            "bogus".to_string(),
            "friday".to_string(),
            "monday".to_string(),
        ];
        assert_eq!(task.weekdays(), vec![Weekday::Friday, Weekday::Monday]);
        assert_eq!(Weekday::Friday.to_chrono(), chrono::Weekday::Fri);
        assert!("Friday".parse::<Weekday>().is_err());
    }

    #[test]
    fn filters_and_counts() {
        let mut done = sample();
        done.id = "T2".to_string();
        done.status = TaskStatus::Completed;
        done.days = vec!["sunday".to_string()];
        let open = sample();
        let tasks = vec![open.clone(), done.clone()];

        assert!(StatusFilter::Completed.matches(&done));
        assert!(!StatusFilter::InProgress.matches(&open));
        assert!("monday".parse::<DayFilter>().unwrap().matches(&open));
        assert!(!"monday".parse::<DayFilter>().unwrap().matches(&done));
        assert_eq!("ALL".parse::<DayFilter>().unwrap(), DayFilter::All);

        let counts = TaskCounts::from_tasks(&tasks);
        assert_eq!(
            counts,
            TaskCounts {
                all: 2,
                completed: 1,
                in_progress: 0
            }
        );
    }
}
