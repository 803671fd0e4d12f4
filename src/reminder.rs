//! Local reminders for tasks.
//!
//! [`Notifier`] is the notification facility: a flat namespace of pending
//! reminders addressed by string id. The [`ReminderScheduler`] derives
//! reminder ids from the task id (`<task>-scheduled`, `<task>_start_<day>`,
//! `<task>_end_<day>`) and records the task id on every request, which is
//! what finds a task's reminders again.
//!
//! Scheduling is best effort. Failures are logged and never returned, so a
//! task mutation never fails because a reminder could not be registered.

use std::cell::{Cell, RefCell};

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::RemindersConfig;
use crate::error::{Error, Result};
use crate::storage::{read_json, write_json, KeyValueStore, REMINDERS_KEY};
use crate::task::{Task, Weekday};
use crate::validation::parse_time;

/// When a reminder fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fire once, right away
    Immediate,
    /// Repeat every week on `weekday` at `hour:minute`
    Weekly {
        weekday: Weekday,
        hour: u32,
        minute: u32,
    },
}

impl Trigger {
    /// Next firing strictly after `now`; `None` for immediate triggers.
    pub fn next_fire_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let Trigger::Weekly {
            weekday,
            hour,
            minute,
        } = *self
        else {
            return None;
        };
        let at = NaiveTime::from_hms_opt(hour, minute, 0)?;
        let target = weekday.to_chrono().num_days_from_monday() as i64;
        let today = now.weekday().num_days_from_monday() as i64;
        let days_ahead = (target - today).rem_euclid(7);
        let candidate = (now.date() + Duration::days(days_ahead)).and_time(at);
        if candidate > now {
            Some(candidate)
        } else {
            Some(candidate + Duration::days(7))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Scheduled,
    Start,
    End,
}

/// A reminder registered with the notification facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub id: String,
    pub task_id: String,
    pub kind: ReminderKind,
    pub title: String,
    pub body: String,
    pub trigger: Trigger,
}

impl ReminderRequest {
    /// Whether this reminder was registered for `task_id`.
    ///
    /// Compares the recorded owner rather than the id prefix, since task ids
    /// may themselves contain `-` or `_`.
    pub fn belongs_to(&self, task_id: &str) -> bool {
        !task_id.is_empty() && self.task_id == task_id
    }
}

/// The notification facility
pub trait Notifier {
    /// Register `request`, replacing any pending reminder with the same id.
    fn register(&self, request: ReminderRequest) -> Result<String>;

    /// Cancel one pending reminder. Unknown ids are ignored.
    fn cancel(&self, id: &str) -> Result<()>;

    fn pending(&self) -> Result<Vec<ReminderRequest>>;

    fn cancel_all(&self) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn register(&self, request: ReminderRequest) -> Result<String> {
        (**self).register(request)
    }

    fn cancel(&self, id: &str) -> Result<()> {
        (**self).cancel(id)
    }

    fn pending(&self) -> Result<Vec<ReminderRequest>> {
        (**self).pending()
    }

    fn cancel_all(&self) -> Result<()> {
        (**self).cancel_all()
    }
}

/// Notifier that keeps pending reminders under `@reminders` in the store,
/// as an outbox for whatever delivers them.
#[derive(Debug, Clone)]
pub struct FileNotifier<S> {
    store: S,
}

impl<S: KeyValueStore> FileNotifier<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<Vec<ReminderRequest>> {
        Ok(read_json(&self.store, REMINDERS_KEY)?.unwrap_or_default())
    }

    fn save(&self, pending: &[ReminderRequest]) -> Result<()> {
        write_json(&self.store, REMINDERS_KEY, pending)
    }
}

impl<S: KeyValueStore> Notifier for FileNotifier<S> {
    fn register(&self, request: ReminderRequest) -> Result<String> {
        let mut pending = self.load()?;
        pending.retain(|existing| existing.id != request.id);
        let id = request.id.clone();
        pending.push(request);
        self.save(&pending)?;
        Ok(id)
    }

    fn cancel(&self, id: &str) -> Result<()> {
        let mut pending = self.load()?;
        let before = pending.len();
        pending.retain(|existing| existing.id != id);
        if pending.len() != before {
            self.save(&pending)?;
        }
        Ok(())
    }

    fn pending(&self) -> Result<Vec<ReminderRequest>> {
        self.load()
    }

    fn cancel_all(&self) -> Result<()> {
        self.store.remove_item(REMINDERS_KEY)
    }
}

/// In-memory notifier; can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    pending: RefCell<Vec<ReminderRequest>>,
    failing: Cell<bool>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`Error::Notification`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn check(&self) -> Result<()> {
        if self.failing.get() {
            return Err(Error::Notification(
                "notification facility unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Notifier for MemoryNotifier {
    fn register(&self, request: ReminderRequest) -> Result<String> {
        self.check()?;
        let mut pending = self.pending.borrow_mut();
        pending.retain(|existing| existing.id != request.id);
        let id = request.id.clone();
        pending.push(request);
        Ok(id)
    }

    fn cancel(&self, id: &str) -> Result<()> {
        self.check()?;
        self.pending.borrow_mut().retain(|existing| existing.id != id);
        Ok(())
    }

    fn pending(&self) -> Result<Vec<ReminderRequest>> {
        self.check()?;
        Ok(self.pending.borrow().clone())
    }

    fn cancel_all(&self) -> Result<()> {
        self.check()?;
        self.pending.borrow_mut().clear();
        Ok(())
    }
}

pub fn scheduled_id(task_id: &str) -> String {
    format!("{task_id}-scheduled")
}

pub fn start_id(task_id: &str, day: Weekday) -> String {
    format!("{task_id}_start_{day}")
}

pub fn end_id(task_id: &str, day: Weekday) -> String {
    format!("{task_id}_end_{day}")
}

/// Registers and cancels the reminders of a task
#[derive(Debug, Clone)]
pub struct ReminderScheduler<N> {
    notifier: N,
    config: RemindersConfig,
}

impl<N: Notifier> ReminderScheduler<N> {
    pub fn new(notifier: N, config: RemindersConfig) -> Self {
        Self { notifier, config }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Re-arm the reminders of `task`. Returns how many were registered.
    pub fn schedule_for_task(&self, task: &Task) -> usize {
        if !task.notifications_enabled {
            return 0;
        }
        if task.id.trim().is_empty() || task.title.trim().is_empty() {
            tracing::warn!(task_id = %task.id, "skipping reminders for task without id or title");
            return 0;
        }

        self.cancel_for_task(&task.id);

        let mut registered = 0;
        for request in self.requests_for(task) {
            let id = request.id.clone();
            match self.notifier.register(request) {
                Ok(_) => registered += 1,
                Err(err) => {
                    tracing::warn!(task_id = %task.id, reminder_id = %id, error = %err, "failed to register reminder");
                }
            }
        }
        tracing::debug!(task_id = %task.id, registered, "scheduled reminders");
        registered
    }

    /// Cancel every pending reminder of `task_id`. Returns how many were
    /// cancelled; zero matches is not an error.
    pub fn cancel_for_task(&self, task_id: &str) -> usize {
        let mut cancelled = 0;
        for reminder in self.reminders_for_task(task_id) {
            match self.notifier.cancel(&reminder.id) {
                Ok(()) => cancelled += 1,
                Err(err) => {
                    tracing::warn!(task_id, reminder_id = %reminder.id, error = %err, "failed to cancel reminder");
                }
            }
        }
        cancelled
    }

    pub fn update_for_task(&self, task: &Task) -> usize {
        self.cancel_for_task(&task.id);
        self.schedule_for_task(task)
    }

    /// Schedule when the task has notifications on, cancel otherwise.
    pub fn toggle_for_task(&self, task: &Task) -> usize {
        if task.notifications_enabled {
            self.schedule_for_task(task)
        } else {
            self.cancel_for_task(&task.id);
            0
        }
    }

    pub fn reminders_for_task(&self, task_id: &str) -> Vec<ReminderRequest> {
        match self.notifier.pending() {
            Ok(pending) => pending
                .into_iter()
                .filter(|reminder| reminder.belongs_to(task_id))
                .collect(),
            Err(err) => {
                tracing::warn!(task_id, error = %err, "failed to list pending reminders");
                Vec::new()
            }
        }
    }

    pub fn pending(&self) -> Result<Vec<ReminderRequest>> {
        self.notifier.pending()
    }

    pub fn cancel_all(&self) -> Result<()> {
        self.notifier.cancel_all()
    }

    fn requests_for(&self, task: &Task) -> Vec<ReminderRequest> {
        let mut requests = Vec::new();

        if self.config.confirmation {
            requests.push(ReminderRequest {
                id: scheduled_id(&task.id),
                task_id: task.id.clone(),
                kind: ReminderKind::Scheduled,
                title: "Task scheduled".to_string(),
                body: format!("The task \"{}\" has been set up", task.title),
                trigger: Trigger::Immediate,
            });
        }

        let start = parse_time(&task.start_time);
        let end = parse_time(&task.end_time);
        if start.is_none() || end.is_none() {
            tracing::warn!(task_id = %task.id, "task times are malformed; only the confirmation is scheduled");
        }

        for day in task.weekdays() {
            if let (true, Some((hour, minute))) = (self.config.at_start, start) {
                requests.push(ReminderRequest {
                    id: start_id(&task.id, day),
                    task_id: task.id.clone(),
                    kind: ReminderKind::Start,
                    title: format!("\"{}\" starts now", task.title),
                    body: format!("{} - {}", task.start_time, task.end_time),
                    trigger: Trigger::Weekly {
                        weekday: day,
                        hour,
                        minute,
                    },
                });
            }
            if let (true, Some((hour, minute))) = (self.config.at_end, end) {
                requests.push(ReminderRequest {
                    id: end_id(&task.id, day),
                    task_id: task.id.clone(),
                    kind: ReminderKind::End,
                    title: format!("\"{}\" is ending", task.title),
                    body: format!("Scheduled until {}", task.end_time),
                    trigger: Trigger::Weekly {
                        weekday: day,
                        hour,
                        minute,
                    },
                });
            }
        }

        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::TaskStatus;
    use chrono::NaiveDate;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
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

    fn ids(reminders: &[ReminderRequest]) -> Vec<String> {
        let mut ids: Vec<String> = reminders.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn belongs_to_compares_recorded_task() {
        let notifier = MemoryNotifier::new();
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());
        scheduler.schedule_for_task(&task("1"));
        scheduler.schedule_for_task(&task("10"));

        let pending = notifier.pending().unwrap();
        let ten = pending.iter().find(|r| r.id == "10-scheduled").unwrap();
        assert!(ten.belongs_to("10"));
        assert!(!ten.belongs_to("1"));
        assert!(!ten.belongs_to(""));
    }

    #[test]
    fn cancel_leaves_tasks_with_delimited_ids_alone() {
        let notifier = MemoryNotifier::new();
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());
        scheduler.schedule_for_task(&task("a"));
        scheduler.schedule_for_task(&task("a-1"));
        scheduler.schedule_for_task(&task("a_start"));

        assert_eq!(scheduler.cancel_for_task("a"), 5);
        assert_eq!(scheduler.reminders_for_task("a-1").len(), 5);
        assert_eq!(scheduler.reminders_for_task("a_start").len(), 5);
        assert!(scheduler.reminders_for_task("a").is_empty());
    }

    #[test]
    fn schedule_registers_confirmation_and_weekly_reminders() {
        let notifier = MemoryNotifier::new();
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());

        let registered = scheduler.schedule_for_task(&task("T1"));
        assert_eq!(registered, 5);
        assert_eq!(
            ids(&notifier.pending().unwrap()),
            vec![
                "T1-scheduled",
                "T1_end_monday",
                "T1_end_wednesday",
                "T1_start_monday",
                "T1_start_wednesday",
            ]
        );

        let start = notifier
            .pending()
            .unwrap()
            .into_iter()
            .find(|r| r.id == "T1_start_wednesday")
            .unwrap();
        assert_eq!(
            start.trigger,
            Trigger::Weekly {
                weekday: Weekday::Wednesday,
                hour: 7,
                minute: 0
            }
        );
    }

    #[test]
    fn schedule_is_idempotent() {
        let notifier = MemoryNotifier::new();
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());
        scheduler.schedule_for_task(&task("T1"));
        scheduler.schedule_for_task(&task("T1"));
        assert_eq!(notifier.pending().unwrap().len(), 5);
    }

    #[test]
    fn schedule_respects_config_and_disabled_tasks() {
        let notifier = MemoryNotifier::new();
        let config = RemindersConfig {
            confirmation: false,
            at_start: true,
            at_end: false,
        };
        let scheduler = ReminderScheduler::new(&notifier, config);
        assert_eq!(scheduler.schedule_for_task(&task("T1")), 2);

        let mut muted = task("T2");
        muted.notifications_enabled = false;
        assert_eq!(scheduler.schedule_for_task(&muted), 0);
        assert!(scheduler.reminders_for_task("T2").is_empty());
    }

    #[test]
    fn cancel_without_reminders_is_noop() {
        let notifier = MemoryNotifier::new();
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());
        assert_eq!(scheduler.cancel_for_task("missing"), 0);
    }

    #[test]
    fn cancel_leaves_other_tasks_alone() {
        let notifier = MemoryNotifier::new();
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());
        scheduler.schedule_for_task(&task("1"));
        scheduler.schedule_for_task(&task("10"));

        assert_eq!(scheduler.cancel_for_task("1"), 5);
        let remaining = notifier.pending().unwrap();
        assert_eq!(remaining.len(), 5);
        assert!(remaining.iter().all(|r| r.task_id == "10"));
    }

    #[test]
    fn toggle_schedules_or_cancels() {
        let notifier = MemoryNotifier::new();
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());
        let mut t = task("T1");
        assert_eq!(scheduler.toggle_for_task(&t), 5);

        t.notifications_enabled = false;
        assert_eq!(scheduler.toggle_for_task(&t), 0);
        assert!(notifier.pending().unwrap().is_empty());
    }

    #[test]
    fn update_replaces_old_days() {
        let notifier = MemoryNotifier::new();
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());
        let mut t = task("T1");
        scheduler.schedule_for_task(&t);

        t.days = vec!["friday".to_string()];
        scheduler.update_for_task(&t);
        assert_eq!(
            ids(&notifier.pending().unwrap()),
            vec!["T1-scheduled", "T1_end_friday", "T1_start_friday"]
        );
    }

    #[test]
    fn failures_are_swallowed() {
        let notifier = MemoryNotifier::new();
        notifier.set_failing(true);
        let scheduler = ReminderScheduler::new(&notifier, RemindersConfig::default());

        assert_eq!(scheduler.schedule_for_task(&task("T1")), 0);
        assert_eq!(scheduler.cancel_for_task("T1"), 0);
        assert!(scheduler.reminders_for_task("T1").is_empty());
        assert!(scheduler.pending().is_err());
    }

    #[test]
    fn file_notifier_persists_outbox() {
        let store = MemoryStore::new();
        let scheduler =
            ReminderScheduler::new(FileNotifier::new(&store), RemindersConfig::default());
        scheduler.schedule_for_task(&task("T1"));

        let reopened = FileNotifier::new(&store);
        assert_eq!(reopened.pending().unwrap().len(), 5);
        reopened.cancel("T1-scheduled").unwrap();
        assert_eq!(scheduler.reminders_for_task("T1").len(), 4);
        reopened.cancel_all().unwrap();
        assert!(scheduler.pending().unwrap().is_empty());
    }

    #[test]
    fn weekly_trigger_computes_next_fire() {
        // 2024-01-03 is a Wednesday.
        let now = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap();

        let later_today = Trigger::Weekly {
            weekday: Weekday::Wednesday,
            hour: 8,
            minute: 0,
        };
        assert_eq!(
            later_today.next_fire_after(now),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(8, 0, 0)
        );

        let already_passed = Trigger::Weekly {
            weekday: Weekday::Wednesday,
            hour: 7,
            minute: 0,
        };
        assert_eq!(
            already_passed.next_fire_after(now),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(7, 0, 0)
        );

        let monday = Trigger::Weekly {
            weekday: Weekday::Monday,
            hour: 7,
            minute: 0,
        };
        assert_eq!(
            monday.next_fire_after(now),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap().and_hms_opt(7, 0, 0)
        );

        assert_eq!(Trigger::Immediate.next_fire_after(now), None);
    }
}
