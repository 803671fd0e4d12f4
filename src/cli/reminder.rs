//! agenda reminder command implementations.

use chrono::Local;
use serde::Serialize;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::reminder::{ReminderKind, ReminderRequest, Trigger};

use super::context::{owned_task, AppContext};
use super::GlobalOptions;

#[derive(Serialize)]
struct ReminderEntry {
    id: String,
    task_id: String,
    kind: ReminderKind,
    title: String,
    trigger: Trigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_fire: Option<String>,
}

#[derive(Serialize)]
struct ReminderListOutput {
    reminders: Vec<ReminderEntry>,
}

#[derive(Serialize)]
struct RearmOutput {
    registered: usize,
}

pub fn run_list(global: &GlobalOptions, task: Option<&str>) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, registry) = ctx.session()?;

    let pending: Vec<ReminderRequest> = match task {
        Some(id) => {
            let task = owned_task(&registry, &user, id)?;
            registry.reminders().reminders_for_task(&task.id)
        }
        None => {
            let owned: Vec<String> = registry
                .list_for_user(&user.username)
                .into_iter()
                .map(|task| task.id.clone())
                .collect();
            registry
                .reminders()
                .pending()?
                .into_iter()
                .filter(|reminder| owned.contains(&reminder.task_id))
                .collect()
        }
    };

    let now = Local::now().naive_local();
    let reminders: Vec<ReminderEntry> = pending
        .into_iter()
        .map(|reminder| ReminderEntry {
            next_fire: reminder
                .trigger
                .next_fire_after(now)
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string()),
            id: reminder.id,
            task_id: reminder.task_id,
            kind: reminder.kind,
            title: reminder.title,
            trigger: reminder.trigger,
        })
        .collect();

    let mut human = HumanOutput::new(format!("{} pending reminder(s)", reminders.len()));
    for entry in &reminders {
        let when = entry.next_fire.as_deref().unwrap_or("immediate");
        human.push_detail(format!("{} [{when}] {}", entry.id, entry.title));
    }

    emit_success(
        global.output(),
        "reminder list",
        &ReminderListOutput { reminders },
        Some(&human),
    )
}

pub fn run_rearm(global: &GlobalOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (user, registry) = ctx.session()?;
    let registered = registry.reschedule_all(&user.username);

    let mut human = HumanOutput::new("Reminders re-armed");
    human.push_summary("Registered", registered.to_string());
    emit_success(
        global.output(),
        "reminder rearm",
        &RearmOutput { registered },
        Some(&human),
    )
}

pub fn run_clear(global: &GlobalOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let (_user, registry) = ctx.session()?;
    registry.reminders().cancel_all()?;

    let mut human = HumanOutput::new("Reminders cleared");
    human.push_next_step("agenda reminder rearm");
    emit_success(
        global.output(),
        "reminder clear",
        &RearmOutput { registered: 0 },
        Some(&human),
    )
}
