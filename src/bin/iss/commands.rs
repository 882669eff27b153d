//! Implementations of the scriptable subcommands.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command as Process;

use anyhow::{bail, Context, Result};
use chrono::Local;

use issue_tracker::config::paths::{data_dir, ensure_directories, CONFIG_FILENAME};
use issue_tracker::config::ProjectFile;
use issue_tracker::export::Exporter;
use issue_tracker::github;
use issue_tracker::model::{status_marker, Issue, IssueUpdate};
use issue_tracker::store::{Database, IssueFilter};
use issue_tracker::term;

use crate::cli::{AddArgs, ExportArgs, ListArgs, QueryArgs, SyncArgs, UpdateArgs};

/// Resolve the project config: explicit flag, working directory, then the
/// git repository root.
pub fn find_project_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        bail!("config not found: {}", path.display());
    }
    let local = env::current_dir()?.join(CONFIG_FILENAME);
    if local.is_file() {
        return Ok(local);
    }
    if let Some(root) = git_root() {
        let candidate = root.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    bail!("no {CONFIG_FILENAME} found here or at the git root; run `iss project` to create one")
}

fn git_root() -> Option<PathBuf> {
    let output = Process::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!root.is_empty()).then(|| PathBuf::from(root))
}

/// Open this project's database under the data dir, creating dirs on the
/// way.
pub fn open_database(config: &ProjectFile) -> Result<Database> {
    ensure_directories().context("cannot create application directories")?;
    Database::open(&data_dir().join(config.db_file_name()))
}

/// Render a numeric issue id through the configured `id_rules.format`
/// (`{num}` with an optional zero-pad width, e.g. `{num:03}`).
pub fn render_id(format: &str, num: i64) -> String {
    if let Some(start) = format.find("{num") {
        let rest = &format[start + 4..];
        if let Some(end) = rest.find('}') {
            let spec = &rest[..end];
            let width = spec
                .strip_prefix(":0")
                .and_then(|w| w.parse::<usize>().ok())
                .unwrap_or(0);
            let rendered = format!("{num:0width$}");
            return format!(
                "{}{}{}",
                &format[..start],
                rendered,
                &rest[end + 1..]
            );
        }
    }
    num.to_string()
}

pub fn cmd_add(args: &AddArgs, config: &ProjectFile, db: &Database) -> Result<()> {
    let id = match &args.id {
        Some(id) => id.clone(),
        None => render_id(&config.id_rules.format, db.next_numeric_id()?),
    };
    if !config.is_valid_id(&id) {
        bail!("invalid id '{id}': ids are digit strings");
    }
    if db.issue_exists(&id)? {
        bail!("id '{id}' already exists");
    }

    let priority = args
        .priority
        .clone()
        .or_else(|| config.priorities.last().cloned())
        .context("config has no priorities")?;
    if !config.is_valid_priority(&priority) {
        bail!(
            "invalid priority '{priority}'; allowed: {}",
            config.priorities.join(", ")
        );
    }
    if !config.is_valid_status(&args.status) {
        bail!(
            "invalid status '{}'; allowed: {}",
            args.status,
            config.statuses.join(", ")
        );
    }

    let discovery_date = args
        .discovery_date
        .clone()
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());

    let issue = Issue {
        id,
        title: args.title.clone(),
        priority,
        status: args.status.clone(),
        discovery_date,
        fix_date: args.fix_date.clone(),
        file_path: args.file.clone(),
        location: args.location.clone(),
        description: args.description.clone(),
        impact: args.impact.clone(),
        fix_plan: args.fix_plan.clone(),
        estimated_hours: args.estimated_hours,
        actual_hours: args.actual_hours,
        phase: args.phase.clone(),
        github_issue_id: args.github_issue_id,
        created_at: None,
        updated_at: None,
    };
    db.add_issue(&issue)?;
    println!(
        "Added: {} - {} [{}/{}]",
        issue.id, issue.title, issue.priority, issue.status
    );
    Ok(())
}

pub fn cmd_update(args: &UpdateArgs, config: &ProjectFile, db: &Database) -> Result<()> {
    if !db.issue_exists(&args.id)? {
        bail!("id '{}' does not exist", args.id);
    }
    if let Some(status) = &args.status {
        if !config.is_valid_status(status) {
            bail!(
                "invalid status '{status}'; allowed: {}",
                config.statuses.join(", ")
            );
        }
    }
    if let Some(priority) = &args.priority {
        if !config.is_valid_priority(priority) {
            bail!(
                "invalid priority '{priority}'; allowed: {}",
                config.priorities.join(", ")
            );
        }
    }

    let update = IssueUpdate {
        title: args.title.clone(),
        priority: args.priority.clone(),
        status: args.status.clone(),
        discovery_date: args.discovery_date.clone(),
        fix_date: args.fix_date.clone(),
        file_path: args.file.clone(),
        location: args.location.clone(),
        description: args.description.clone(),
        impact: args.impact.clone(),
        fix_plan: args.fix_plan.clone(),
        estimated_hours: args.estimated_hours,
        actual_hours: args.actual_hours,
        phase: args.phase.clone(),
        github_issue_id: args.github_issue_id,
    };
    if update.is_empty() {
        println!("{}", term::warn("nothing to update"));
        return Ok(());
    }
    if db.update_issue(&args.id, &update)? {
        println!("Updated: {}", args.id);
    } else {
        bail!("update of '{}' changed nothing", args.id);
    }
    Ok(())
}

pub fn cmd_query(args: &QueryArgs, db: &Database) -> Result<()> {
    let filter = IssueFilter {
        id: args.id.clone(),
        priority: args.priority.clone(),
        status: args.status.clone(),
        phase: args.phase.clone(),
        file_glob: args.file.clone(),
        github_issue_id: args.github,
    };
    let issues = db.query_issues(&filter)?;
    if issues.is_empty() {
        println!("No matching issues.");
        return Ok(());
    }
    if args.detail {
        for issue in &issues {
            print_issue_detail(issue);
            println!("{}", "-".repeat(60));
        }
    } else {
        print_issue_table(&issues);
    }
    println!("\n{} issue(s)", issues.len());
    Ok(())
}

pub fn cmd_list(args: &ListArgs, db: &Database) -> Result<()> {
    let filter = IssueFilter {
        status: args.status.clone(),
        priority: args.priority.clone(),
        ..IssueFilter::default()
    };
    let issues = db.query_issues(&filter)?;
    if issues.is_empty() {
        println!("No matching issues.");
        return Ok(());
    }
    print_issue_table(&issues);
    println!("\n{} issue(s)", issues.len());
    Ok(())
}

pub fn cmd_stats(config: &ProjectFile, db: &Database) -> Result<()> {
    let stats = db.stats()?;
    let width = 50;
    let bar = "=".repeat(width);

    println!("{bar}");
    println!("  {} — issue statistics", config.project.name);
    println!("{bar}");
    println!("  Total: {}", stats.total);
    println!();

    println!("  By priority:");
    println!("  {:<10} {:>5} {:>6} {:>6} {:>6}", "priority", "total", "fixed", "open", "done");
    for priority in &config.priorities {
        let detail = stats.by_priority_detail.get(priority);
        let total: i64 = detail.map(|d| d.values().sum()).unwrap_or(0);
        let fixed = detail.and_then(|d| d.get("fixed")).copied().unwrap_or(0);
        let na = detail.and_then(|d| d.get("n_a")).copied().unwrap_or(0);
        let open = total - fixed - na;
        let pct = if total > 0 {
            format!("{}%", fixed * 100 / total)
        } else {
            "N/A".to_string()
        };
        println!("  {priority:<10} {total:>5} {fixed:>6} {open:>6} {pct:>6}");
    }
    println!();

    println!("  By status:");
    let mut by_status: Vec<(&String, &i64)> = stats.by_status.iter().collect();
    by_status.sort_by_key(|(_, count)| -**count);
    for (status, count) in by_status {
        let bar_len = if stats.total > 0 {
            (count * 30 / stats.total) as usize
        } else {
            0
        };
        println!("    {status:<15} {count:>4}  {}", "█".repeat(bar_len));
    }
    println!("{bar}");
    Ok(())
}

pub fn cmd_export(args: &ExportArgs, config: &ProjectFile, db: &Database) -> Result<()> {
    let path = Exporter::new(config, db).export(args.output.as_deref())?;
    println!("Exported to: {}", path.display());
    Ok(())
}

pub fn cmd_sync(args: &SyncArgs, config: &ProjectFile, db: &Database) -> Result<()> {
    let mut stdout = std::io::stdout();
    github::sync(config, db, args.dry_run, &mut stdout)?;
    Ok(())
}

fn print_issue_table(issues: &[Issue]) {
    let id_w = issues.iter().map(|i| i.id.len()).max().unwrap_or(2).max(2);
    let title_w = issues
        .iter()
        .map(|i| i.title.chars().count())
        .max()
        .unwrap_or(5)
        .clamp(5, 50);

    println!(
        "  {:<id_w$}  {:<title_w$}  {:<8}  {:<12}  {}",
        "id", "title", "priority", "discovered", "status"
    );
    println!(
        "  {}  {}  {}  {}  {}",
        "-".repeat(id_w),
        "-".repeat(title_w),
        "-".repeat(8),
        "-".repeat(12),
        "-".repeat(8)
    );
    for issue in issues {
        let title: String = if issue.title.chars().count() > title_w {
            let mut t: String = issue.title.chars().take(title_w - 2).collect();
            t.push_str("..");
            t
        } else {
            issue.title.clone()
        };
        println!(
            "  {:<id_w$}  {:<title_w$}  {:<8}  {:<12}  {}",
            issue.id,
            title,
            issue.priority,
            issue.discovery_date,
            status_marker(&issue.status)
        );
    }
}

fn print_issue_detail(issue: &Issue) {
    println!("\n  [{}] {}", issue.id, issue.title);
    println!(
        "  priority: {}  |  status: {}  |  discovered: {}",
        issue.priority,
        status_marker(&issue.status),
        issue.discovery_date
    );
    if let Some(date) = &issue.fix_date {
        println!("  fixed: {date}");
    }
    if let Some(files) = &issue.file_path {
        println!("  files: {files}");
    }
    if let Some(location) = &issue.location {
        println!("  location: {location}");
    }
    for (name, text) in [
        ("description", &issue.description),
        ("impact", &issue.impact),
        ("fix plan", &issue.fix_plan),
    ] {
        if let Some(text) = text {
            let shown: String = text.chars().take(200).collect();
            let ellipsis = if text.chars().count() > 200 { "..." } else { "" };
            println!("  {name}: {shown}{ellipsis}");
        }
    }
    let mut hours = Vec::new();
    if let Some(h) = issue.estimated_hours {
        hours.push(format!("estimated {h}h"));
    }
    if let Some(h) = issue.actual_hours {
        hours.push(format!("actual {h}h"));
    }
    if !hours.is_empty() {
        println!("  hours: {}", hours.join(", "));
    }
    if let Some(gh) = issue.github_issue_id {
        println!("  GitHub issue: #{gh}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_id_pads_to_requested_width() {
        assert_eq!(render_id("{num:03}", 7), "007");
        assert_eq!(render_id("{num:03}", 1234), "1234");
        assert_eq!(render_id("{num}", 7), "7");
    }

    #[test]
    fn render_id_without_placeholder_falls_back_to_plain_number() {
        assert_eq!(render_id("issue", 7), "7");
    }
}
