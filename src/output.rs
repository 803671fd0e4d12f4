//! Output formatting shared by agenda commands.
//!
//! Every command emits either a JSON envelope (`--json`) or a human report
//! built from a [`HumanOutput`]: a header line followed by optional
//! summary, details, warnings and next-step sections.

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "agenda.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data: Some(data),
            error: None,
            warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.clone()).unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        let payload: Envelope<'_, ()> = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            data: None,
            error: Some(JsonError::from(err)),
            warnings: Vec::new(),
            next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    if !output.summary.is_empty() {
        lines.push(String::new());
        lines.push("Summary:".to_string());
        for (key, value) in &output.summary {
            if value.is_empty() {
                lines.push(format!("- {key}"));
            } else {
                lines.push(format!("- {key}: {value}"));
            }
        }
    }
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// Command name for error envelopes, read from raw args so it is known
/// even when clap rejects the invocation.
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

/// Global options that take a separate value.
const VALUE_OPTIONS: &[&str] = &["--data-dir"];

fn command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut skip_value = false;
    let mut positional = args.into_iter().filter(|arg| {
        if std::mem::take(&mut skip_value) {
            return false;
        }
        if VALUE_OPTIONS.contains(&arg.as_str()) {
            skip_value = true;
        }
        !arg.starts_with('-')
    });
    let Some(command) = positional.next() else {
        return "agenda".to_string();
    };
    if matches!(command.as_str(), "task" | "reminder") {
        if let Some(sub) = positional.next() {
            return format!("{command} {sub}");
        }
    }
    command
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::Authentication { code, .. } => match *code {
            "NOT_LOGGED_IN" | "INVALID_CREDENTIALS" => {
                vec!["agenda login <username> --password <password>".to_string()]
            }
            "NO_USER_REGISTERED" => {
                vec!["agenda register <username> --password <password>".to_string()]
            }
            _ => Vec::new(),
        },
        Error::TaskNotFound(_) => vec!["agenda task list".to_string()],
        Error::CorruptData { key, .. } => {
            vec![format!("inspect or remove the {key} file in the data directory")]
        }
        Error::InvalidConfig(_) | Error::TomlParse(_) => {
            vec!["fix agenda.toml then retry".to_string()]
        }
        Error::LockFailed(_) => vec!["retry once other agenda commands finish".to_string()],
        _ => Vec::new(),
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}
