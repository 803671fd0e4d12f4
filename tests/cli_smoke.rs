use assert_cmd::Command;
use predicates::str::contains;

mod support;

use support::TestEnv;

#[test]
fn agenda_help_works() {
    Command::cargo_bin("agenda")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Usage: agenda"));
}

#[test]
fn subcommand_help_works() {
    let subcommands: [&[&str]; 9] = [
        &["init"],
        &["register"],
        &["login"],
        &["logout"],
        &["whoami"],
        &["passwd"],
        &["task"],
        &["task", "add"],
        &["reminder"],
    ];

    for cmd in subcommands {
        Command::cargo_bin("agenda")
            .expect("binary")
            .args(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn init_writes_default_config() {
    let env = TestEnv::new();
    env.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("agenda initialized"));

    let config = std::fs::read_to_string(env.data_dir().join("agenda.toml")).expect("config");
    assert!(config.contains("min_duration_minutes = 15"));

    env.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("(kept)"));
}

#[test]
fn task_commands_require_login() {
    let env = TestEnv::new();
    env.cmd()
        .args(["task", "list"])
        .assert()
        .code(2)
        .stderr(contains("not logged in"))
        .stderr(contains("hint: agenda login"));
}

#[test]
fn json_error_envelope() {
    let env = TestEnv::new();
    let value = env.json(&["login", "ana", "--password", "secret"]);
    assert_eq!(value["schema_version"], "agenda.v1");
    assert_eq!(value["command"], "login");
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["kind"], "authentication");
    assert_eq!(value["error"]["code"], "NO_USER_REGISTERED");
    assert_eq!(value["error"]["exit_code"], 2);
}

#[test]
fn quiet_suppresses_human_output() {
    let env = TestEnv::registered();
    env.cmd()
        .args(["--quiet", "whoami"])
        .assert()
        .success()
        .stdout("");
}
