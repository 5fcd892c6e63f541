//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn cli_without_arguments_prints_usage() {
    let mut cmd = cargo_bin_cmd!("blockctl");
    cmd.assert().failure().stderr(contains("Usage"));
}

#[test]
fn cli_rejects_unknown_subcommands() {
    let mut cmd = cargo_bin_cmd!("blockctl");
    cmd.arg("teleport");
    cmd.assert().failure().stderr(contains("teleport"));
}

#[test]
fn volume_create_requires_a_size() {
    let mut cmd = cargo_bin_cmd!("blockctl");
    cmd.args(["volume", "create"]);
    cmd.assert().failure().stderr(contains("SIZE_GB"));
}

#[test]
fn profile_create_rejects_a_malformed_definition() {
    let mut cmd = cargo_bin_cmd!("blockctl");
    cmd.args(["profile", "create", "not json"]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("invalid request"));
}
