//! Issue record and sync-log types.

/// One tracked issue. Dates are `YYYY-MM-DD` strings; `file_path` may hold
/// several comma-separated paths.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub priority: String,
    pub status: String,
    pub discovery_date: String,
    pub fix_date: Option<String>,
    pub file_path: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub impact: Option<String>,
    pub fix_plan: Option<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub phase: Option<String>,
    pub github_issue_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Partial update applied to an existing issue; `None` fields are left
/// alone.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub discovery_date: Option<String>,
    pub fix_date: Option<String>,
    pub file_path: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub impact: Option<String>,
    pub fix_plan: Option<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub phase: Option<String>,
    pub github_issue_id: Option<i64>,
}

impl IssueUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.discovery_date.is_none()
            && self.fix_date.is_none()
            && self.file_path.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.impact.is_none()
            && self.fix_plan.is_none()
            && self.estimated_hours.is_none()
            && self.actual_hours.is_none()
            && self.phase.is_none()
            && self.github_issue_id.is_none()
    }
}

/// One row of the GitHub sync audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncLogEntry {
    pub id: i64,
    pub issue_id: String,
    pub github_issue_id: i64,
    pub action: String,
    pub status: String,
    pub error_msg: Option<String>,
    pub synced_at: Option<String>,
}

/// Human-readable status marker used by tables and the Markdown export.
pub fn status_marker(status: &str) -> &str {
    match status {
        "fixed" => "✅ fixed",
        "pending" => "❌ pending",
        "in_progress" => "🟢 in progress",
        "planned" => "📋 planned",
        "n_a" => "⚠️ n/a",
        other => other,
    }
}

/// Statuses that still count as open work.
pub fn is_open_status(status: &str) -> bool {
    matches!(status, "pending" | "in_progress" | "planned")
}
