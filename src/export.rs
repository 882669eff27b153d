//! Markdown report generation from the issue database.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::debug;

use crate::config::ProjectFile;
use crate::model::{is_open_status, status_marker, Issue};
use crate::store::{Database, Stats};

pub struct Exporter<'a> {
    config: &'a ProjectFile,
    db: &'a Database,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a ProjectFile, db: &'a Database) -> Self {
        Exporter { config, db }
    }

    /// Render the report and write it to `output` (default: the configured
    /// export path, relative paths resolved against the current directory).
    pub fn export(&self, output: Option<&Path>) -> Result<PathBuf> {
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.export.output));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = self.render()?;
        fs::write(&path, content)
            .with_context(|| format!("cannot write export: {}", path.display()))?;
        debug!(path = %path.display(), "export written");
        Ok(path)
    }

    /// The full document as a string (separately callable for tests).
    pub fn render(&self) -> Result<String> {
        let issues = self.db.query_issues(&Default::default())?;
        let stats = self.db.stats()?;

        let mut sections = Vec::new();
        sections.push(self.header(&stats));
        sections.push(self.statistics(&issues, &stats));
        for priority in &self.config.priorities {
            let group: Vec<&Issue> = sorted_by_id(
                issues.iter().filter(|i| &i.priority == priority).collect(),
            );
            if !group.is_empty() {
                sections.push(self.priority_section(priority, &group));
            }
        }
        sections.push(self.pending_section(&issues));
        sections.push(self.footer());
        Ok(sections.join("\n"))
    }

    fn header(&self, stats: &Stats) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M");
        let fixed = stats.by_status.get("fixed").copied().unwrap_or(0);
        let na = stats.by_status.get("n_a").copied().unwrap_or(0);
        let open = stats.total - fixed - na;
        [
            format!("# {} — Issue Report", self.config.project.name),
            String::new(),
            format!("> Generated: {now}"),
            format!(
                "> Total: {} | Fixed: {fixed} | Open: {open}",
                stats.total
            ),
            String::new(),
            "---".to_string(),
            String::new(),
        ]
        .join("\n")
    }

    fn statistics(&self, issues: &[Issue], stats: &Stats) -> String {
        let mut lines = vec![
            "## Statistics".to_string(),
            String::new(),
            "### By priority".to_string(),
            String::new(),
            "| Priority | Total | Fixed | Open | Progress |".to_string(),
            "|----------|-------|-------|------|----------|".to_string(),
        ];

        let mut grand = (0i64, 0i64, 0i64);
        for priority in &self.config.priorities {
            let empty = BTreeMap::new();
            let detail = stats.by_priority_detail.get(priority).unwrap_or(&empty);
            let total: i64 = detail.values().sum();
            let fixed = detail.get("fixed").copied().unwrap_or(0);
            let na = detail.get("n_a").copied().unwrap_or(0);
            let open = total - fixed - na;
            lines.push(format!(
                "| {priority} | {total} | {fixed} | {open} | {} |",
                progress(fixed, total)
            ));
            grand.0 += total;
            grand.1 += fixed;
            grand.2 += open;
        }
        lines.push(format!(
            "| **Total** | **{}** | **{}** | **{}** | **{}** |",
            grand.0,
            grand.1,
            grand.2,
            progress(grand.1, grand.0)
        ));

        lines.extend([
            String::new(),
            "### Summary".to_string(),
            String::new(),
            "| Id | Title | Priority | Discovered | Status |".to_string(),
            "|----|-------|----------|------------|--------|".to_string(),
        ]);
        for issue in sorted_by_id(issues.iter().collect()) {
            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                issue.id,
                issue.title,
                issue.priority,
                issue.discovery_date,
                status_marker(&issue.status)
            ));
        }
        lines.extend([String::new(), "---".to_string(), String::new()]);
        lines.join("\n")
    }

    fn priority_section(&self, priority: &str, group: &[&Issue]) -> String {
        let mut lines = vec![format!("## {priority} issues"), String::new()];
        for issue in group {
            lines.push(format_issue(issue));
            lines.push("---".to_string());
            lines.push(String::new());
        }
        lines.join("\n")
    }

    fn pending_section(&self, issues: &[Issue]) -> String {
        let open: Vec<&Issue> = issues.iter().filter(|i| is_open_status(&i.status)).collect();
        if open.is_empty() {
            return "## Open work\n\nEverything is fixed or not applicable.\n\n---\n".to_string();
        }

        let mut lines = vec!["## Open work".to_string(), String::new()];
        for priority in &self.config.priorities {
            let group: Vec<&Issue> = sorted_by_id(
                open.iter()
                    .copied()
                    .filter(|i| &i.priority == priority)
                    .collect(),
            );
            if group.is_empty() {
                continue;
            }
            lines.push(format!("### {priority}"));
            let total_hours: f64 = group.iter().filter_map(|i| i.estimated_hours).sum();
            for (n, issue) in group.iter().enumerate() {
                let hours = issue
                    .estimated_hours
                    .map(|h| format!(" ({}h)", format_hours(h)))
                    .unwrap_or_default();
                lines.push(format!(
                    "{}. **{}**: {}{hours} {}",
                    n + 1,
                    issue.id,
                    issue.title,
                    status_marker(&issue.status)
                ));
            }
            lines.push(String::new());
            lines.push(format!("**Estimated**: {} hours", format_hours(total_hours)));
            lines.push(String::new());
        }
        lines.extend(["---".to_string(), String::new()]);
        lines.join("\n")
    }

    fn footer(&self) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M");
        format!("---\n\n**Maintained by**: issue-tracker (generated)\n**Generated**: {now}\n")
    }
}

fn format_issue(issue: &Issue) -> String {
    let mut lines = vec![format!(
        "### {}: {} - {}",
        issue.id,
        issue.title,
        status_marker(&issue.status)
    )];
    lines.push(format!("**Discovered**: {}", issue.discovery_date));

    if let Some(paths) = &issue.file_path {
        let wrapped: Vec<String> = paths
            .split(',')
            .map(|p| format!("`{}`", p.trim()))
            .collect();
        lines.push(format!("**Files**: {}", wrapped.join(", ")));
    }
    if let Some(location) = &issue.location {
        lines.push(format!("**Location**: {location}"));
    }
    lines.push(String::new());

    for (title, body) in [
        ("Description", &issue.description),
        ("Impact", &issue.impact),
        ("Fix plan", &issue.fix_plan),
    ] {
        if let Some(text) = body {
            lines.push(format!("**{title}**:"));
            lines.push(text.clone());
            lines.push(String::new());
        }
    }

    if let Some(hours) = issue.estimated_hours {
        lines.push(format!("**Estimated**: {} hours", format_hours(hours)));
    }
    if let Some(hours) = issue.actual_hours {
        lines.push(format!("**Actual**: {} hours", format_hours(hours)));
    }
    lines.push(format!("**Priority**: {}", issue.priority));
    if issue.status == "fixed" {
        if let Some(date) = &issue.fix_date {
            lines.push(format!("**Status**: ✅ fixed ({date})"));
        }
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Sort by `(prefix, numeric part)` so `2` comes before `10`.
fn sorted_by_id<'a>(mut issues: Vec<&'a Issue>) -> Vec<&'a Issue> {
    issues.sort_by_key(|issue| id_sort_key(&issue.id));
    issues
}

fn id_sort_key(id: &str) -> (String, i64) {
    if let Some((prefix, number)) = id.split_once('-') {
        if let Ok(n) = number.parse::<i64>() {
            return (prefix.to_string(), n);
        }
    }
    if let Ok(n) = id.parse::<i64>() {
        return (String::new(), n);
    }
    (id.to_string(), 0)
}

fn progress(fixed: i64, total: i64) -> String {
    if total > 0 {
        format!("{}%", fixed * 100 / total)
    } else {
        "N/A".to_string()
    }
}

fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{}", hours as i64)
    } else {
        format!("{hours:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalDefaults;

    fn setup() -> (ProjectFile, Database) {
        let config = ProjectFile::seeded("001".into(), "Demo".into(), &GlobalDefaults::builtin());
        let db = Database::open_in_memory().unwrap();
        let mut a = Issue {
            id: "2".into(),
            title: "later".into(),
            priority: "P1".into(),
            status: "pending".into(),
            discovery_date: "2026-01-02".into(),
            ..Issue::default()
        };
        a.estimated_hours = Some(1.5);
        db.add_issue(&a).unwrap();
        let b = Issue {
            id: "10".into(),
            title: "big number".into(),
            priority: "P0".into(),
            status: "fixed".into(),
            discovery_date: "2026-01-01".into(),
            fix_date: Some("2026-01-05".into()),
            file_path: Some("src/a.rs, src/b.rs".into()),
            ..Issue::default()
        };
        db.add_issue(&b).unwrap();
        (config, db)
    }

    #[test]
    fn render_contains_all_sections() {
        let (config, db) = setup();
        let doc = Exporter::new(&config, &db).render().unwrap();
        assert!(doc.contains("# Demo — Issue Report"));
        assert!(doc.contains("## Statistics"));
        assert!(doc.contains("## P0 issues"));
        assert!(doc.contains("## P1 issues"));
        assert!(doc.contains("## Open work"));
        assert!(doc.contains("**Files**: `src/a.rs`, `src/b.rs`"));
        assert!(doc.contains("✅ fixed (2026-01-05)"));
    }

    #[test]
    fn summary_sorts_ids_numerically() {
        let (config, db) = setup();
        let doc = Exporter::new(&config, &db).render().unwrap();
        let id2 = doc.find("| 2 | later").unwrap();
        let id10 = doc.find("| 10 | big number").unwrap();
        assert!(id2 < id10);
    }

    #[test]
    fn open_work_lists_only_open_statuses_with_hours() {
        let (config, db) = setup();
        let doc = Exporter::new(&config, &db).render().unwrap();
        assert!(doc.contains("1. **2**: later (1.5h) ❌ pending"));
        assert!(!doc.contains("**10**: big number (")); // fixed issue not listed
    }

    #[test]
    fn export_writes_to_override_path() {
        let (config, db) = setup();
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out/report.md");
        let written = Exporter::new(&config, &db).export(Some(&target)).unwrap();
        assert_eq!(written, target);
        assert!(fs::read_to_string(target).unwrap().contains("# Demo"));
    }

    #[test]
    fn hour_formatting_drops_trailing_zero() {
        assert_eq!(format_hours(2.0), "2");
        assert_eq!(format_hours(1.5), "1.5");
    }

    #[test]
    fn empty_database_renders_clean_report() {
        let config = ProjectFile::seeded("001".into(), "Demo".into(), &GlobalDefaults::builtin());
        let db = Database::open_in_memory().unwrap();
        let doc = Exporter::new(&config, &db).render().unwrap();
        assert!(doc.contains("Everything is fixed or not applicable."));
    }
}
