//! Command-line interface for agenda
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::output::OutputOptions;

mod context;
mod reminder;
mod task;
mod user;

/// agenda - weekly task planner
///
/// Keeps recurring, time-boxed tasks for the local user and the reminders
/// that go with them.
#[derive(Parser, Debug)]
#[command(name = "agenda")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = "AGENDA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and a default agenda.toml
    Init,

    /// Register the device account and log in
    Register {
        username: String,

        #[arg(long, env = "AGENDA_PASSWORD")]
        password: String,
    },

    /// Log in as the registered user
    Login {
        username: String,

        #[arg(long, env = "AGENDA_PASSWORD")]
        password: String,
    },

    /// Close the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Change the password of the logged-in user
    Passwd {
        /// Current password
        #[arg(long)]
        current: String,

        /// New password
        #[arg(long)]
        new: String,
    },

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Pending reminders
    #[command(subcommand)]
    Reminder(ReminderCommands),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a task
    Add {
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Weekdays, comma separated (monday,wednesday)
        #[arg(long, value_delimiter = ',', required = true)]
        days: Vec<String>,

        /// Start time (HH:MM)
        #[arg(long)]
        start: String,

        /// End time (HH:MM)
        #[arg(long)]
        end: String,

        /// Explicit task id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Create with notifications disabled
        #[arg(long)]
        no_notify: bool,
    },

    /// Add tasks from a JSON file (one object or an array)
    Import { file: PathBuf },

    /// Validate task fields without saving
    Check {
        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,

        #[arg(long, default_value = "")]
        start: String,

        #[arg(long, default_value = "")]
        end: String,
    },

    /// Edit a task
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<String>>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,
    },

    /// List tasks of the logged-in user
    List {
        /// Status filter: all, completed, in-progress
        #[arg(long, default_value = "all")]
        status: String,

        /// Day filter: all or a weekday
        #[arg(long, default_value = "all")]
        day: String,
    },

    /// Show one task and its reminders
    Show { id: String },

    /// Delete a task and cancel its reminders
    Rm { id: String },

    /// Set the status: undefined, in-progress, completed
    Status { id: String, status: String },

    /// Advance the status one step
    Cycle { id: String },

    /// Toggle notifications for a task
    Notify { id: String },

    /// Move a task to a position in the list
    Move { id: String, to: usize },

    /// Task totals per status
    Counts,
}

#[derive(Subcommand, Debug)]
pub enum ReminderCommands {
    /// List pending reminders
    List {
        /// Only reminders of this task
        #[arg(long)]
        task: Option<String>,
    },

    /// Re-register reminders for every task of the logged-in user
    Rearm,

    /// Cancel every pending reminder
    Clear,
}

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = GlobalOptions {
            data_dir: self.data_dir,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init => user::run_init(&global),
            Commands::Register { username, password } => {
                user::run_register(&global, user::CredentialsOptions { username, password })
            }
            Commands::Login { username, password } => {
                user::run_login(&global, user::CredentialsOptions { username, password })
            }
            Commands::Logout => user::run_logout(&global),
            Commands::Whoami => user::run_whoami(&global),
            Commands::Passwd { current, new } => {
                user::run_passwd(&global, user::PasswdOptions { current, new })
            }
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    title,
                    description,
                    days,
                    start,
                    end,
                    id,
                    no_notify,
                } => task::run_add(
                    &global,
                    task::AddOptions {
                        title,
                        description,
                        days,
                        start,
                        end,
                        id,
                        notify: !no_notify,
                    },
                ),
                TaskCommands::Import { file } => task::run_import(&global, file),
                TaskCommands::Check {
                    title,
                    days,
                    start,
                    end,
                } => task::run_check(
                    &global,
                    task::CheckOptions {
                        title,
                        days,
                        start,
                        end,
                    },
                ),
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    days,
                    start,
                    end,
                } => task::run_edit(
                    &global,
                    task::EditOptions {
                        id,
                        title,
                        description,
                        days,
                        start,
                        end,
                    },
                ),
                TaskCommands::List { status, day } => {
                    task::run_list(&global, task::ListOptions { status, day })
                }
                TaskCommands::Show { id } => task::run_show(&global, &id),
                TaskCommands::Rm { id } => task::run_rm(&global, &id),
                TaskCommands::Status { id, status } => task::run_status(&global, &id, &status),
                TaskCommands::Cycle { id } => task::run_cycle(&global, &id),
                TaskCommands::Notify { id } => task::run_notify(&global, &id),
                TaskCommands::Move { id, to } => task::run_move(&global, &id, to),
                TaskCommands::Counts => task::run_counts(&global),
            },
            Commands::Reminder(cmd) => match cmd {
                ReminderCommands::List { task } => reminder::run_list(&global, task.as_deref()),
                ReminderCommands::Rearm => reminder::run_rearm(&global),
                ReminderCommands::Clear => reminder::run_clear(&global),
            },
        }
    }
}
