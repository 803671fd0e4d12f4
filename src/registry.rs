//! Task registry.
//!
//! Owns the in-memory task list and orchestrates validation, persistence
//! and reminders. Every mutation builds the new list, saves it, and only
//! then replaces the in-memory list, so a failed save leaves the registry
//! unchanged. Reminder work happens after the save and never fails the
//! mutation.

use crate::error::{Error, Result};
use crate::reminder::{Notifier, ReminderScheduler};
use crate::storage::{KeyValueStore, TaskStore};
use crate::task::{DayFilter, StatusFilter, Task, TaskCounts, TaskDraft, TaskStatus};
use crate::validation::{ValidationLimits, TASK_VALIDATION_CODE};

pub struct TaskRegistry<S, N> {
    store: TaskStore<S>,
    reminders: ReminderScheduler<N>,
    limits: ValidationLimits,
    tasks: Vec<Task>,
}

impl<S: KeyValueStore, N: Notifier> TaskRegistry<S, N> {
    /// Load the persisted list.
    pub fn open(store: TaskStore<S>, reminders: ReminderScheduler<N>) -> Result<Self> {
        let tasks = store.load()?;
        tracing::debug!(count = tasks.len(), "loaded tasks");
        Ok(Self {
            store,
            reminders,
            limits: ValidationLimits::default(),
            tasks,
        })
    }

    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn reminders(&self) -> &ReminderScheduler<N> {
        &self.reminders
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Validate and append a new task, then schedule its reminders.
    pub fn add(&mut self, draft: TaskDraft) -> Result<Task> {
        let task = self.prepare(draft)?;
        if self.get(&task.id).is_some() {
            return Err(Error::TaskExists(task.id));
        }

        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;

        self.reminders.schedule_for_task(&task);
        tracing::debug!(task_id = %task.id, "added task");
        Ok(task)
    }

    /// Append every draft or none of them.
    ///
    /// All drafts are validated and checked for duplicate ids before the
    /// single save, so one bad entry leaves the stored list untouched.
    pub fn add_all(&mut self, drafts: Vec<TaskDraft>) -> Result<Vec<Task>> {
        let mut added: Vec<Task> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let task = self.prepare(draft)?;
            if self.get(&task.id).is_some() || added.iter().any(|t| t.id == task.id) {
                return Err(Error::TaskExists(task.id));
            }
            added.push(task);
        }

        let mut next = self.tasks.clone();
        next.extend(added.iter().cloned());
        self.commit(next)?;

        for task in &added {
            self.reminders.schedule_for_task(task);
        }
        tracing::debug!(count = added.len(), "added tasks");
        Ok(added)
    }

    pub fn update(&mut self, id: &str, draft: TaskDraft) -> Result<Task> {
        let index = self.position(id)?;
        if let Some(draft_id) = draft.id.as_deref() {
            if !draft_id.is_empty() && draft_id != id {
                return Err(Error::InvalidArgument(format!(
                    "task id cannot change ('{id}' -> '{draft_id}')"
                )));
            }
        }
        self.limits
            .validate_task(&draft)
            .into_result(TASK_VALIDATION_CODE)?;

        let current = &self.tasks[index];
        let notifications_enabled = draft
            .notifications_enabled
            .unwrap_or(current.notifications_enabled);
        let updated = Task {
            id: current.id.clone(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            days: draft.days,
            start_time: draft.start_time,
            end_time: draft.end_time,
            owner: current.owner.clone(),
            status: draft.status,
            notifications_enabled,
        };

        let mut next = self.tasks.clone();
        next[index] = updated.clone();
        self.commit(next)?;

        self.reminders.update_for_task(&updated);
        Ok(updated)
    }

    /// Change only the status. No validation, no reminder changes.
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Task> {
        let index = self.position(id)?;
        let mut next = self.tasks.clone();
        next[index].status = status;
        let task = next[index].clone();
        self.commit(next)?;
        Ok(task)
    }

    /// Advance the status one step along the cycle.
    pub fn toggle_status(&mut self, id: &str) -> Result<Task> {
        let current = self.position(id).map(|index| self.tasks[index].status)?;
        self.set_status(id, current.next())
    }

    /// Cancel the task's reminders, then remove it.
    pub fn delete(&mut self, id: &str) -> Result<Task> {
        let index = self.position(id)?;
        self.reminders.cancel_for_task(id);

        let mut next = self.tasks.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        tracing::debug!(task_id = %id, "deleted task");
        Ok(removed)
    }

    /// Flip notifications for the task, then schedule or cancel accordingly.
    pub fn toggle_notifications(&mut self, id: &str) -> Result<Task> {
        let index = self.position(id)?;
        let mut next = self.tasks.clone();
        next[index].notifications_enabled = !next[index].notifications_enabled;
        let task = next[index].clone();
        self.commit(next)?;

        self.reminders.toggle_for_task(&task);
        Ok(task)
    }

    /// Tasks owned by `username`, in stored order.
    pub fn list_for_user(&self, username: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.owner == username)
            .collect()
    }

    pub fn filter_for_user(
        &self,
        username: &str,
        status: StatusFilter,
        day: DayFilter,
    ) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.owner == username && status.matches(task) && day.matches(task))
            .collect()
    }

    pub fn counts_for_user(&self, username: &str) -> TaskCounts {
        TaskCounts::from_tasks(self.list_for_user(username))
    }

    /// Move a task to `to_index` within its owner's list. Indexes past the
    /// end move it last.
    pub fn move_task(&mut self, id: &str, to_index: usize) -> Result<Task> {
        let from = self.position(id)?;
        let mut next = self.tasks.clone();
        let task = next.remove(from);

        let owned: Vec<usize> = next
            .iter()
            .enumerate()
            .filter(|(_, other)| other.owner == task.owner)
            .map(|(index, _)| index)
            .collect();
        let insert_at = match owned.get(to_index) {
            Some(&index) => index,
            None => owned.last().map(|&index| index + 1).unwrap_or(next.len()),
        };
        next.insert(insert_at, task.clone());

        self.commit(next)?;
        Ok(task)
    }

    /// Re-arm reminders for every task of `username`. Returns how many
    /// reminders were registered.
    pub fn reschedule_all(&self, username: &str) -> usize {
        self.list_for_user(username)
            .into_iter()
            .map(|task| self.reminders.schedule_for_task(task))
            .sum()
    }

    fn prepare(&self, draft: TaskDraft) -> Result<Task> {
        self.limits
            .validate_task(&draft)
            .into_result(TASK_VALIDATION_CODE)?;
        if draft.owner.trim().is_empty() {
            return Err(Error::validation(
                TASK_VALIDATION_CODE,
                "task must belong to a user",
            ));
        }
        Ok(Task::from_draft(draft))
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        self.store.save(&next)?;
        self.tasks = next;
        Ok(())
    }
}
