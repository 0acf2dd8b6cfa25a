// Binary-level behaviour that needs no server: help, completion, init and
// configuration errors.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `air` running in an empty directory with an empty home.
fn air(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("air").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("AIR_LOG");
    cmd
}

#[test]
fn test_help_lists_workflow_commands() {
    let dir = TempDir::new().unwrap();

    air(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start-work"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("finish-review"))
        .stdout(predicate::str::contains("complete-tickets").not());
}

#[test]
fn test_complete_subcommands_includes_default_aliases() {
    let dir = TempDir::new().unwrap();

    air(&dir)
        .arg("complete-subcommands")
        .assert()
        .success()
        .stdout(predicate::str::contains("make-branch:Create a feature branch for a ticket"))
        .stdout(predicate::str::contains("mkbranch:alias for make-branch"));
}

#[test]
fn test_underscored_names_are_accepted() {
    let dir = TempDir::new().unwrap();

    air(&dir)
        .arg("_complete_subcommands")
        .assert()
        .success()
        .stdout(predicate::str::contains("list-tickets:"));
}

#[test]
fn test_init_writes_once() {
    let dir = TempDir::new().unwrap();

    air(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains(".airrc"));
    assert!(dir.path().join(".airrc").exists());

    air(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_configured_alias_is_expanded() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".airrc"),
        "[aliases]\ncmds = \"complete_subcommands\"\n",
    )
    .unwrap();

    air(&dir)
        .arg("cmds")
        .assert()
        .success()
        .stdout(predicate::str::contains("cmds:alias for complete-subcommands"));
}

#[test]
fn test_missing_section_is_reported() {
    let dir = TempDir::new().unwrap();

    air(&dir)
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("[jira] section is missing"));
}

#[test]
fn test_ticket_required_outside_working_copy() {
    let dir = TempDir::new().unwrap();

    air(&dir)
        .arg("refresh")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ticket number required"));
}

#[test]
fn test_explicit_config_file_must_exist() {
    let dir = TempDir::new().unwrap();

    air(&dir)
        .args(["--config", "missing.toml", "list-tickets"])
        .assert()
        .failure();
}
