//! Command-line surface of `iss`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Issue tracker with SQLite storage, Markdown export, and GitHub sync.
#[derive(Debug, Parser)]
#[command(name = "iss", about = "Issue Tracker CLI", version)]
pub struct Cli {
    /// Path to the project configuration file (default: ./issue-tracker.yaml,
    /// then the git root)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable file logging (debug)
    #[arg(long, env = "ISS_LOGS", global = true, default_value_t = false)]
    pub logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new issue
    Add(AddArgs),
    /// Update fields of an existing issue
    Update(UpdateArgs),
    /// Filtered query with optional detail view
    Query(QueryArgs),
    /// Compact table of issues
    List(ListArgs),
    /// Statistics overview
    Stats,
    /// Write the Markdown report
    Export(ExportArgs),
    /// Close fixed issues on GitHub
    Sync(SyncArgs),
    /// Create or edit the project configuration interactively
    Project,
    /// Interactive management menu
    Ui,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Issue id (digits; default: next free number per id_rules)
    #[arg(long)]
    pub id: Option<String>,
    /// Issue title
    #[arg(long)]
    pub title: String,
    /// Priority (default: the lowest configured priority)
    #[arg(long)]
    pub priority: Option<String>,
    /// Status
    #[arg(long, default_value = "pending")]
    pub status: String,
    /// Discovery date YYYY-MM-DD (default: today)
    #[arg(long)]
    pub discovery_date: Option<String>,
    /// Fix date YYYY-MM-DD
    #[arg(long)]
    pub fix_date: Option<String>,
    /// File path(s), comma-separated
    #[arg(long)]
    pub file: Option<String>,
    /// Location description (line numbers etc.)
    #[arg(long)]
    pub location: Option<String>,
    /// Problem description
    #[arg(long)]
    pub description: Option<String>,
    /// Impact
    #[arg(long)]
    pub impact: Option<String>,
    /// Planned fix
    #[arg(long)]
    pub fix_plan: Option<String>,
    /// Estimated hours
    #[arg(long)]
    pub estimated_hours: Option<f64>,
    /// Actual hours
    #[arg(long)]
    pub actual_hours: Option<f64>,
    /// Project phase
    #[arg(long)]
    pub phase: Option<String>,
    /// Linked GitHub issue number
    #[arg(long)]
    pub github_issue_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Issue id
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub discovery_date: Option<String>,
    #[arg(long)]
    pub fix_date: Option<String>,
    #[arg(long)]
    pub file: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub impact: Option<String>,
    #[arg(long)]
    pub fix_plan: Option<String>,
    #[arg(long)]
    pub estimated_hours: Option<f64>,
    #[arg(long)]
    pub actual_hours: Option<f64>,
    #[arg(long)]
    pub phase: Option<String>,
    #[arg(long)]
    pub github_issue_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Exact id match
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub phase: Option<String>,
    /// File path glob (e.g. src/hal/*)
    #[arg(long)]
    pub file: Option<String>,
    /// Linked GitHub issue number
    #[arg(long)]
    pub github: Option<i64>,
    /// Expand full descriptions
    #[arg(long, default_value_t = false)]
    pub detail: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output path (default: export.output from the config)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Preview without closing anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
