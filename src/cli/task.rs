//! agenda task command implementations.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::reminder::ReminderRequest;
use crate::task::{DayFilter, StatusFilter, Task, TaskCounts, TaskDraft, TaskStatus};
use crate::validation::{Verdict, INVALID_TASK_DATA_CODE, TASK_VALIDATION_CODE};

use super::context::{owned_task, AppContext, Registry};
use super::GlobalOptions;

pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub days: Vec<String>,
    pub start: String,
    pub end: String,
    pub id: Option<String>,
    pub notify: bool,
}

pub struct CheckOptions {
    pub title: String,
    pub days: Vec<String>,
    pub start: String,
    pub end: String,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub days: Option<Vec<String>>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub struct ListOptions {
    pub status: String,
    pub day: String,
}

#[derive(Serialize)]
struct TaskOutput<'a> {
    task: &'a Task,
    reminders: usize,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    user: &'a str,
    counts: TaskCounts,
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
struct TaskShowOutput<'a> {
    task: &'a Task,
    reminders: Vec<ReminderRequest>,
}

#[derive(Serialize)]
struct ImportOutput {
    imported: Vec<Task>,
}

pub fn run_add(global: &GlobalOptions, options: AddOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, mut registry) = ctx.session()?;

    let draft = TaskDraft {
        id: options.id,
        title: options.title,
        description: options.description,
        days: options.days,
        start_time: options.start,
        end_time: options.end,
        owner: user.username,
        status: TaskStatus::Undefined,
        notifications_enabled: Some(options.notify),
    };
    let task = registry.add(draft)?;

    emit_task(global, "task add", "Task added", &registry, &task)
}

pub fn run_import(global: &GlobalOptions, file: PathBuf) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, mut registry) = ctx.session()?;
    let limits = ctx.config.tasks.limits();

    let content = std::fs::read_to_string(&file).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => {
            Error::InvalidArgument(format!("import file not found: {}", file.display()))
        }
        _ => Error::unknown(format!("failed to read {}", file.display()), err),
    })?;
    let values = match serde_json::from_str::<Value>(&content).map_err(invalid_task_data)? {
        Value::Array(items) => items,
        single => vec![single],
    };

    let mut drafts = Vec::with_capacity(values.len());
    for value in values {
        limits
            .validate_task_value(&value)
            .into_result(TASK_VALIDATION_CODE)?;
        let mut draft: TaskDraft = serde_json::from_value(value).map_err(invalid_task_data)?;
        draft.owner = user.username.clone();
        drafts.push(draft);
    }
    let imported = registry.add_all(drafts)?;

    let mut human = HumanOutput::new(format!("Imported {} task(s)", imported.len()));
    for task in &imported {
        human.push_detail(task_line(task));
    }
    emit_success(
        global.output(),
        "task import",
        &ImportOutput { imported },
        Some(&human),
    )
}

fn invalid_task_data(err: serde_json::Error) -> Error {
    Error::validation(INVALID_TASK_DATA_CODE, format!("invalid task data: {err}"))
}

pub fn run_check(global: &GlobalOptions, options: CheckOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let draft = TaskDraft {
        title: options.title,
        days: options.days,
        start_time: options.start,
        end_time: options.end,
        ..TaskDraft::default()
    };
    let verdict: Verdict = ctx.config.tasks.limits().validate_task(&draft);

    let human = match &verdict.error {
        None => HumanOutput::new("Task is valid"),
        Some(message) => HumanOutput::new(format!("Task is invalid: {message}")),
    };
    emit_success(global.output(), "task check", &verdict, Some(&human))
}

pub fn run_edit(global: &GlobalOptions, options: EditOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, mut registry) = ctx.session()?;
    let current = owned_task(&registry, &user, &options.id)?;

    let mut draft = current.to_draft();
    if let Some(title) = options.title {
        draft.title = title;
    }
    if let Some(description) = options.description {
        draft.description = description;
    }
    if let Some(days) = options.days {
        draft.days = days;
    }
    if let Some(start) = options.start {
        draft.start_time = start;
    }
    if let Some(end) = options.end {
        draft.end_time = end;
    }

    let task = registry.update(&current.id, draft)?;
    emit_task(global, "task edit", "Task updated", &registry, &task)
}

pub fn run_list(global: &GlobalOptions, options: ListOptions) -> Result<()> {
    let status: StatusFilter = options.status.parse()?;
    let day: DayFilter = options.day.parse()?;

    let ctx = AppContext::load(global)?;
    let (user, registry) = ctx.session()?;
    let tasks = registry.filter_for_user(&user.username, status, day);
    let counts = registry.counts_for_user(&user.username);

    let mut human = HumanOutput::new(format!("Tasks for {}", user.username));
    human.push_summary("All", counts.all.to_string());
    human.push_summary("Completed", counts.completed.to_string());
    human.push_summary("In progress", counts.in_progress.to_string());
    if tasks.is_empty() {
        human.push_detail("no tasks");
    }
    for task in &tasks {
        human.push_detail(task_line(task));
    }

    emit_success(
        global.output(),
        "task list",
        &TaskListOutput {
            user: &user.username,
            counts,
            tasks,
        },
        Some(&human),
    )
}

pub fn run_show(global: &GlobalOptions, id: &str) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, registry) = ctx.session()?;
    let task = owned_task(&registry, &user, id)?;
    let reminders = registry.reminders().reminders_for_task(&task.id);

    let mut human = task_human(format!("Task {}", task.id), &task, reminders.len());
    if !task.description.is_empty() {
        human.push_detail(task.description.clone());
    }
    for reminder in &reminders {
        human.push_detail(format!("reminder {}: {}", reminder.id, reminder.title));
    }

    emit_success(
        global.output(),
        "task show",
        &TaskShowOutput {
            task: &task,
            reminders,
        },
        Some(&human),
    )
}

pub fn run_rm(global: &GlobalOptions, id: &str) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, mut registry) = ctx.session()?;
    owned_task(&registry, &user, id)?;
    let removed = registry.delete(id)?;

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", removed.id.clone());
    human.push_summary("Title", removed.title.clone());
    emit_success(
        global.output(),
        "task rm",
        &TaskOutput {
            task: &removed,
            reminders: 0,
        },
        Some(&human),
    )
}

pub fn run_status(global: &GlobalOptions, id: &str, status: &str) -> Result<()> {
    let status: TaskStatus = status.parse()?;
    let ctx = AppContext::load(global)?;
    let (user, mut registry) = ctx.session()?;
    owned_task(&registry, &user, id)?;
    let task = registry.set_status(id, status)?;
    emit_task(global, "task status", "Task status updated", &registry, &task)
}

pub fn run_cycle(global: &GlobalOptions, id: &str) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, mut registry) = ctx.session()?;
    owned_task(&registry, &user, id)?;
    let task = registry.toggle_status(id)?;
    emit_task(global, "task cycle", "Task status updated", &registry, &task)
}

pub fn run_notify(global: &GlobalOptions, id: &str) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, mut registry) = ctx.session()?;
    owned_task(&registry, &user, id)?;
    let task = registry.toggle_notifications(id)?;
    let header = if task.notifications_enabled {
        "Notifications enabled"
    } else {
        "Notifications disabled"
    };
    emit_task(global, "task notify", header, &registry, &task)
}

pub fn run_move(global: &GlobalOptions, id: &str, to: usize) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, mut registry) = ctx.session()?;
    owned_task(&registry, &user, id)?;
    let task = registry.move_task(id, to)?;

    let order: Vec<&Task> = registry.list_for_user(&user.username);
    let position = order
        .iter()
        .position(|other| other.id == task.id)
        .ok_or_else(|| Error::TaskNotFound(task.id.clone()))?;

    let mut human = HumanOutput::new("Task moved");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Position", position.to_string());
    for other in &order {
        human.push_detail(task_line(other));
    }
    emit_success(
        global.output(),
        "task move",
        &TaskListOutput {
            user: &user.username,
            counts: TaskCounts::from_tasks(order.iter().copied()),
            tasks: order,
        },
        Some(&human),
    )
}

pub fn run_counts(global: &GlobalOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, registry) = ctx.session()?;
    let counts = registry.counts_for_user(&user.username);

    let mut human = HumanOutput::new(format!("Task counts for {}", user.username));
    human.push_summary("All", counts.all.to_string());
    human.push_summary("Completed", counts.completed.to_string());
    human.push_summary("In progress", counts.in_progress.to_string());
    emit_success(global.output(), "task counts", &counts, Some(&human))
}

fn emit_task(
    global: &GlobalOptions,
    command: &str,
    header: &str,
    registry: &Registry,
    task: &Task,
) -> Result<()> {
    let reminders = registry.reminders().reminders_for_task(&task.id).len();
    let human = task_human(header.to_string(), task, reminders);
    emit_success(
        global.output(),
        command,
        &TaskOutput { task, reminders },
        Some(&human),
    )
}

fn task_human(header: String, task: &Task, reminders: usize) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Days", task.days.join(", "));
    human.push_summary("Time", format!("{}-{}", task.start_time, task.end_time));
    human.push_summary("Status", task.status.to_string());
    human.push_summary(
        "Notifications",
        if task.notifications_enabled { "on" } else { "off" },
    );
    human.push_summary("Reminders", reminders.to_string());
    human
}

fn task_line(task: &Task) -> String {
    let marker = match task.status {
        TaskStatus::Completed => "[x]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Undefined => "[ ]",
    };
    format!(
        "{marker} {} {} ({} {}-{})",
        task.id,
        task.title,
        task.days.join(","),
        task.start_time,
        task.end_time
    )
}
