//! agenda - weekly task planner library
//!
//! Core of the agenda CLI: recurring tasks owned by a local user, validated
//! on entry, persisted as JSON, with local reminders kept in step.
//!
//! # Core Concepts
//!
//! - **Task**: a titled activity on one or more weekdays between a start and
//!   an end time, with a three-state status
//! - **Verdict**: `{is_valid, error}` outcome of a validation rule
//! - **Reminder**: a pending notification derived from a task, addressed by
//!   an id prefixed with the task id
//! - **Registry**: the task collection, keeping storage and reminders in step
//!
//! # Module Organization
//!
//! - `validation`: title, days and time rules plus the task aggregator
//! - `task`: task records, status cycle, filters and counts
//! - `storage`: key-value store abstraction and the JSON task adapter
//! - `reminder`: notification facility and per-task reminder scheduling
//! - `registry`: task operations (add, update, status, delete, ...)
//! - `auth`: the single device account and its session
//! - `config`: `agenda.toml` loading
//! - `lock`: file locking and atomic writes
//! - `output`: human and JSON output
//! - `cli`: command-line interface using clap

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod registry;
pub mod reminder;
pub mod storage;
pub mod task;
pub mod validation;

pub use error::{Error, Result};
