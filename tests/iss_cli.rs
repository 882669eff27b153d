use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn iss_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_iss").expect("iss test binary not built")
}

fn combined_output(output: &Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

/// Run `iss` in `dir` with config/data dirs redirected into it.
fn run_iss(dir: &Path, args: &[&str]) -> Output {
    Command::new(iss_bin())
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg-config"))
        .env("XDG_DATA_HOME", dir.join("xdg-data"))
        .env_remove("ISS_LOGS")
        .output()
        .expect("run iss")
}

fn write_config(dir: &Path) {
    fs::write(
        dir.join("issue-tracker.yaml"),
        "\
project:
  id: \"001\"
  name: Demo
id_rules:
  format: \"{num:03}\"
priorities: [P0, P1, P2, P3]
statuses: [pending, in_progress, planned, fixed, n_a]
github:
  enabled: false
  close_on_fix: false
  comment_template: \"Auto-sync: {issue_id} fixed\"
export:
  output: exports/demo_issues.md
",
    )
    .expect("write config");
}

#[test]
fn help_mentions_subcommands() {
    let output = Command::new(iss_bin())
        .arg("--help")
        .output()
        .expect("run iss --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    for subcommand in ["add", "update", "query", "list", "stats", "export", "sync", "ui"] {
        assert!(combined.contains(subcommand), "missing {subcommand}");
    }
}

#[test]
fn commands_without_config_fail_with_hint() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run_iss(tmp.path(), &["list"]);
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("iss project"));
}

#[test]
fn add_list_stats_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path());

    let output = run_iss(
        tmp.path(),
        &[
            "add",
            "--title",
            "First bug",
            "--priority",
            "P1",
            "--estimated-hours",
            "2.5",
        ],
    );
    assert!(output.status.success(), "{}", combined_output(&output));
    // No --id: the first auto id renders through id_rules.format.
    assert!(combined_output(&output).contains("Added: 001 - First bug [P1/pending]"));

    let output = run_iss(tmp.path(), &["list"]);
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("First bug"));
    assert!(combined.contains("1 issue(s)"));

    let output = run_iss(tmp.path(), &["stats"]);
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("Demo — issue statistics"));
    assert!(combined.contains("Total: 1"));
}

#[test]
fn add_rejects_duplicate_and_invalid_values() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path());

    let ok = run_iss(tmp.path(), &["add", "--id", "007", "--title", "t", "--priority", "P0"]);
    assert!(ok.status.success());

    let dup = run_iss(tmp.path(), &["add", "--id", "007", "--title", "again"]);
    assert!(!dup.status.success());
    assert!(combined_output(&dup).contains("already exists"));

    let bad = run_iss(
        tmp.path(),
        &["add", "--title", "t", "--priority", "urgent"],
    );
    assert!(!bad.status.success());
    assert!(combined_output(&bad).contains("invalid priority"));
}

#[test]
fn update_then_query_shows_new_status() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path());

    run_iss(tmp.path(), &["add", "--id", "001", "--title", "bug", "--priority", "P0"]);
    let output = run_iss(
        tmp.path(),
        &["update", "001", "--status", "fixed", "--fix-date", "2026-02-01"],
    );
    assert!(output.status.success(), "{}", combined_output(&output));

    let output = run_iss(tmp.path(), &["query", "--status", "fixed", "--detail"]);
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("[001] bug"));
    assert!(combined.contains("fixed: 2026-02-01"));
}

#[test]
fn export_writes_markdown_report() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path());
    run_iss(tmp.path(), &["add", "--id", "001", "--title", "bug", "--priority", "P0"]);

    let target = tmp.path().join("report.md");
    let output = run_iss(
        tmp.path(),
        &["export", "--output", target.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", combined_output(&output));
    let report = fs::read_to_string(&target).expect("report written");
    assert!(report.contains("# Demo — Issue Report"));
    assert!(report.contains("| 001 | bug |"));
}

#[test]
fn sync_reports_disabled_github() {
    let tmp = tempfile::tempdir().unwrap();
    write_config(tmp.path());
    let output = run_iss(tmp.path(), &["sync", "--dry-run"]);
    assert!(output.status.success());
    assert!(combined_output(&output).contains("disabled"));
}
