//! GitHub synchronization through the `gh` CLI.
//!
//! Everything here shells out to `gh` with a hard timeout; a missing binary
//! or a hung network call degrades to a reported failure, never a crash.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::config::ProjectFile;
use crate::store::Database;

const AUTH_TIMEOUT: Duration = Duration::from_secs(5);
const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(30);
const VERSION_TIMEOUT: Duration = Duration::from_secs(3);

/// Why a `gh` invocation produced no usable output.
#[derive(Debug)]
pub enum GhError {
    /// `gh` is not installed or not on PATH.
    Missing,
    /// The command exceeded its deadline and was killed.
    Timeout,
    /// The command ran and exited non-zero.
    Failed(String),
    Io(std::io::Error),
}

impl std::fmt::Display for GhError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GhError::Missing => write!(f, "gh CLI is not installed or not on PATH"),
            GhError::Timeout => write!(f, "gh command timed out"),
            GhError::Failed(stderr) => write!(f, "gh command failed: {stderr}"),
            GhError::Io(err) => write!(f, "gh invocation failed: {err}"),
        }
    }
}

impl std::error::Error for GhError {}

fn run_gh(args: &[&str], timeout: Duration) -> Result<Output, GhError> {
    debug!(?args, "running gh");
    let child = Command::new("gh")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                GhError::Missing
            } else {
                GhError::Io(err)
            }
        })?;

    let pid = child.id();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) => Err(GhError::Io(err)),
        Err(_) => {
            // Deadline passed: reap the child so it cannot linger.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGKILL);
            }
            Err(GhError::Timeout)
        }
    }
}

fn require_success(output: Output) -> Result<Output, GhError> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(GhError::Failed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }
}

/// `gh --version`, first line, for the environment report.
pub fn version() -> Result<String, GhError> {
    let output = require_success(run_gh(&["--version"], VERSION_TIMEOUT)?)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().to_string())
}

/// Combined output of `gh auth status` (which reports on stderr).
pub fn auth_status() -> Result<String, GhError> {
    let output = run_gh(&["auth", "status"], AUTH_TIMEOUT)?;
    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(combined.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct RepoEntry {
    #[serde(rename = "nameWithOwner")]
    name_with_owner: String,
}

/// Repositories visible to the logged-in account, as `owner/name`.
pub fn list_repos(limit: usize) -> Result<Vec<String>, GhError> {
    let limit = limit.to_string();
    let output = require_success(run_gh(
        &["repo", "list", "--limit", &limit, "--json", "nameWithOwner"],
        LIST_TIMEOUT,
    )?)?;
    let entries: Vec<RepoEntry> =
        serde_json::from_slice(&output.stdout).map_err(|err| GhError::Failed(err.to_string()))?;
    Ok(entries.into_iter().map(|e| e.name_with_owner).collect())
}

/// Close one GitHub issue with a comment.
pub fn close_issue(github_issue_id: i64, comment: &str) -> Result<(), GhError> {
    let id = github_issue_id.to_string();
    require_success(run_gh(
        &["issue", "close", &id, "--comment", comment],
        CLOSE_TIMEOUT,
    )?)?;
    Ok(())
}

/// Outcome summary of one sync run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pending: usize,
    pub success: usize,
    pub failed: usize,
}

/// Close the GitHub issue behind every fixed-and-linked entry that has not
/// been synced yet, recording each attempt in the sync log.
pub fn sync(
    config: &ProjectFile,
    db: &Database,
    dry_run: bool,
    out: &mut impl Write,
) -> Result<SyncReport> {
    if !config.github.enabled {
        writeln!(out, "GitHub sync is disabled (github.enabled = false)")?;
        return Ok(SyncReport::default());
    }
    if !config.github.close_on_fix {
        writeln!(out, "GitHub close_on_fix is disabled")?;
        return Ok(SyncReport::default());
    }

    let pending = db.pending_github_sync()?;
    if pending.is_empty() {
        writeln!(out, "Nothing to sync.")?;
        return Ok(SyncReport::default());
    }

    writeln!(out, "Pending sync: {} issue(s)", pending.len())?;
    let mut report = SyncReport {
        pending: pending.len(),
        ..SyncReport::default()
    };

    for issue in &pending {
        let gh_id = issue
            .github_issue_id
            .context("pending sync row without github_issue_id")?;
        let comment = render_comment(&config.github.comment_template, &issue.id);
        writeln!(out, "  {} -> GitHub issue #{gh_id} ({})", issue.id, issue.title)?;

        if dry_run {
            writeln!(
                out,
                "    [dry-run] would run: gh issue close {gh_id} --comment \"{comment}\""
            )?;
            continue;
        }

        match close_issue(gh_id, &comment) {
            Ok(()) => {
                db.log_github_sync(&issue.id, gh_id, "close", "success", None)?;
                report.success += 1;
                writeln!(out, "    ✓ closed #{gh_id}")?;
            }
            Err(err) => {
                let msg = err.to_string();
                db.log_github_sync(&issue.id, gh_id, "close", "failed", Some(&msg))?;
                report.failed += 1;
                writeln!(out, "    ✗ close failed: {msg}")?;
            }
        }
    }

    writeln!(
        out,
        "Sync finished: {} succeeded, {} failed",
        report.success, report.failed
    )?;
    Ok(report)
}

/// Substitute `{issue_id}` in the configured comment template.
pub fn render_comment(template: &str, issue_id: &str) -> String {
    template.replace("{issue_id}", issue_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalDefaults;
    use crate::model::Issue;

    #[test]
    fn comment_template_substitutes_issue_id() {
        assert_eq!(
            render_comment("Auto-sync: {issue_id} fixed", "007"),
            "Auto-sync: 007 fixed"
        );
        assert_eq!(render_comment("static text", "007"), "static text");
    }

    #[test]
    fn sync_disabled_reports_and_does_nothing() {
        let config = ProjectFile::seeded("001".into(), "Demo".into(), &GlobalDefaults::builtin());
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        let report = sync(&config, &db, false, &mut out).unwrap();
        assert_eq!(report, SyncReport::default());
        assert!(String::from_utf8_lossy(&out).contains("disabled"));
    }

    #[test]
    fn dry_run_previews_without_logging() {
        let mut config =
            ProjectFile::seeded("001".into(), "Demo".into(), &GlobalDefaults::builtin());
        config.github.enabled = true;
        config.github.close_on_fix = true;

        let db = Database::open_in_memory().unwrap();
        let mut fixed = Issue {
            id: "001".into(),
            title: "t".into(),
            priority: "P0".into(),
            status: "fixed".into(),
            discovery_date: "2026-01-01".into(),
            ..Issue::default()
        };
        fixed.github_issue_id = Some(9);
        db.add_issue(&fixed).unwrap();

        let mut out = Vec::new();
        let report = sync(&config, &db, true, &mut out).unwrap();
        assert_eq!(report.pending, 1);
        assert_eq!(report.success, 0);
        assert!(String::from_utf8_lossy(&out).contains("[dry-run]"));
        // Dry runs leave no trace in the sync log.
        assert!(db.sync_log().unwrap().is_empty());
    }
}
