//! Account and session commands.

use serde::Serialize;

use crate::auth::User;
use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

use super::context::AppContext;
use super::GlobalOptions;

pub struct CredentialsOptions {
    pub username: String,
    pub password: String,
}

pub struct PasswdOptions {
    pub current: String,
    pub new: String,
}

#[derive(Serialize)]
struct InitOutput {
    data_dir: String,
    config: String,
    created_config: bool,
}

#[derive(Serialize)]
struct UserOutput {
    username: String,
    logged_in: bool,
}

impl UserOutput {
    fn new(user: &User, logged_in: bool) -> Self {
        Self {
            username: user.username.clone(),
            logged_in,
        }
    }
}

pub fn run_init(global: &GlobalOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let config_path = ctx.store.root().join(CONFIG_FILE);
    let created_config = !config_path.exists();
    if created_config {
        Config::default().save(&config_path)?;
    }

    let output = InitOutput {
        data_dir: ctx.store.root().display().to_string(),
        config: config_path.display().to_string(),
        created_config,
    };

    let mut human = HumanOutput::new("agenda initialized");
    human.push_summary("Data dir", output.data_dir.clone());
    human.push_summary(
        "Config",
        if created_config {
            format!("{} (created)", output.config)
        } else {
            format!("{} (kept)", output.config)
        },
    );
    human.push_next_step("agenda register <username> --password <password>");

    emit_success(global.output(), "init", &output, Some(&human))
}

pub fn run_register(global: &GlobalOptions, options: CredentialsOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let user = ctx
        .auth()
        .register(User::new(options.username.trim(), options.password))?;

    let mut human = HumanOutput::new(format!("Registered {}", user.username));
    human.push_summary("Session", "open");
    human.push_next_step("agenda task add <title> --days monday --start 07:00 --end 08:00");

    emit_success(
        global.output(),
        "register",
        &UserOutput::new(&user, true),
        Some(&human),
    )
}

pub fn run_login(global: &GlobalOptions, options: CredentialsOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let user = ctx.auth().login(options.username.trim(), &options.password)?;

    let human = HumanOutput::new(format!("Logged in as {}", user.username));
    emit_success(
        global.output(),
        "login",
        &UserOutput::new(&user, true),
        Some(&human),
    )
}

pub fn run_logout(global: &GlobalOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    ctx.auth().logout()?;

    #[derive(Serialize)]
    struct LogoutOutput {
        logged_in: bool,
    }

    let human = HumanOutput::new("Logged out");
    emit_success(
        global.output(),
        "logout",
        &LogoutOutput { logged_in: false },
        Some(&human),
    )
}

pub fn run_whoami(global: &GlobalOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let user = ctx.auth().require_user()?;
    let session = ctx.auth().users().load_session()?;

    let mut human = HumanOutput::new(user.username.clone());
    if let Some(session) = session {
        human.push_summary("Since", session.logged_in_at.to_rfc3339());
    }
    emit_success(
        global.output(),
        "whoami",
        &UserOutput::new(&user, true),
        Some(&human),
    )
}

pub fn run_passwd(global: &GlobalOptions, options: PasswdOptions) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let user = ctx
        .auth()
        .update_password(&options.current, &options.new)?;

    let human = HumanOutput::new(format!("Password updated for {}", user.username));
    emit_success(
        global.output(),
        "passwd",
        &UserOutput::new(&user, true),
        Some(&human),
    )
}
