//! SQLite persistence for issues and the GitHub sync log.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};
use tracing::debug;

use crate::model::{Issue, IssueUpdate, SyncLogEntry};

const SCHEMA_SQL: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS issues (
    id              TEXT    PRIMARY KEY,
    title           TEXT    NOT NULL,
    priority        TEXT    NOT NULL,
    status          TEXT    NOT NULL DEFAULT 'pending',
    discovery_date  TEXT    NOT NULL,
    fix_date        TEXT,
    file_path       TEXT,
    location        TEXT,
    description     TEXT,
    impact          TEXT,
    fix_plan        TEXT,
    estimated_hours REAL,
    actual_hours    REAL,
    phase           TEXT,
    github_issue_id INTEGER,
    created_at      TEXT    DEFAULT (datetime('now')),
    updated_at      TEXT    DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS github_sync_log (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id        TEXT    NOT NULL,
    github_issue_id INTEGER NOT NULL,
    action          TEXT    NOT NULL,
    status          TEXT    NOT NULL,
    error_msg       TEXT,
    synced_at       TEXT    DEFAULT (datetime('now')),
    FOREIGN KEY (issue_id) REFERENCES issues(id)
);

CREATE INDEX IF NOT EXISTS idx_priority       ON issues(priority);
CREATE INDEX IF NOT EXISTS idx_status         ON issues(status);
CREATE INDEX IF NOT EXISTS idx_discovery_date ON issues(discovery_date);
CREATE INDEX IF NOT EXISTS idx_github         ON issues(github_issue_id);

CREATE VIEW IF NOT EXISTS v_pending AS
    SELECT id, title, priority, status, discovery_date, file_path
    FROM issues
    WHERE status IN ('pending', 'in_progress', 'planned')
    ORDER BY priority, discovery_date;

CREATE VIEW IF NOT EXISTS v_summary AS
    SELECT id, title, priority, status, discovery_date, fix_date, github_issue_id
    FROM issues
    ORDER BY id;
";

/// Optional filters for [`Database::query_issues`]; unset fields do not
/// constrain the result.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub id: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub phase: Option<String>,
    pub file_glob: Option<String>,
    pub github_issue_id: Option<i64>,
}

/// Aggregated counts for `stats` and the export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub total: i64,
    pub by_priority: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
    pub by_priority_detail: BTreeMap<String, BTreeMap<String, i64>>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) and apply the schema idempotently.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("cannot open database: {}", path.display()))?;
        conn.execute_batch(SCHEMA_SQL)
            .context("schema initialization failed")?;
        debug!(db = %path.display(), "database opened");
        Ok(Database { conn })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("cannot open in-memory database")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("schema initialization failed")?;
        Ok(Database { conn })
    }

    // ── issue CRUD ────────────────────────────────────────────────────

    /// Insert a new issue; a duplicate id is an error.
    pub fn add_issue(&self, issue: &Issue) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO issues
                   (id, title, priority, status, discovery_date, fix_date, file_path,
                    location, description, impact, fix_plan, estimated_hours,
                    actual_hours, phase, github_issue_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    issue.id,
                    issue.title,
                    issue.priority,
                    issue.status,
                    issue.discovery_date,
                    issue.fix_date,
                    issue.file_path,
                    issue.location,
                    issue.description,
                    issue.impact,
                    issue.fix_plan,
                    issue.estimated_hours,
                    issue.actual_hours,
                    issue.phase,
                    issue.github_issue_id,
                ],
            )
            .with_context(|| format!("cannot insert issue {}", issue.id))?;
        debug!(id = %issue.id, "issue added");
        Ok(())
    }

    /// Insert or replace (import path).
    pub fn upsert_issue(&self, issue: &Issue) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO issues
                   (id, title, priority, status, discovery_date, fix_date, file_path,
                    location, description, impact, fix_plan, estimated_hours,
                    actual_hours, phase, github_issue_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    issue.id,
                    issue.title,
                    issue.priority,
                    issue.status,
                    issue.discovery_date,
                    issue.fix_date,
                    issue.file_path,
                    issue.location,
                    issue.description,
                    issue.impact,
                    issue.fix_plan,
                    issue.estimated_hours,
                    issue.actual_hours,
                    issue.phase,
                    issue.github_issue_id,
                ],
            )
            .with_context(|| format!("cannot upsert issue {}", issue.id))?;
        Ok(())
    }

    pub fn get_issue(&self, issue_id: &str) -> Result<Option<Issue>> {
        self.conn
            .query_row(
                "SELECT * FROM issues WHERE id = ?1",
                params![issue_id],
                row_to_issue,
            )
            .optional()
            .with_context(|| format!("cannot read issue {issue_id}"))
    }

    /// Apply a partial update, bumping `updated_at`. Returns whether a row
    /// actually changed.
    pub fn update_issue(&self, issue_id: &str, update: &IssueUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        macro_rules! push_field {
            ($field:ident) => {
                if let Some(v) = &update.$field {
                    clauses.push(concat!(stringify!($field), " = ?"));
                    values.push(Box::new(v.clone()));
                }
            };
        }
        push_field!(title);
        push_field!(priority);
        push_field!(status);
        push_field!(discovery_date);
        push_field!(fix_date);
        push_field!(file_path);
        push_field!(location);
        push_field!(description);
        push_field!(impact);
        push_field!(fix_plan);
        push_field!(estimated_hours);
        push_field!(actual_hours);
        push_field!(phase);
        push_field!(github_issue_id);

        clauses.push("updated_at = datetime('now')");
        values.push(Box::new(issue_id.to_string()));

        let sql = format!("UPDATE issues SET {} WHERE id = ?", clauses.join(", "));
        let changed = self
            .conn
            .execute(&sql, params_from_iter(values.iter().map(|v| v.as_ref())))
            .with_context(|| format!("cannot update issue {issue_id}"))?;
        debug!(id = issue_id, changed, "issue updated");
        Ok(changed > 0)
    }

    pub fn delete_issue(&self, issue_id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM issues WHERE id = ?1", params![issue_id])
            .with_context(|| format!("cannot delete issue {issue_id}"))?;
        Ok(changed > 0)
    }

    pub fn issue_exists(&self, issue_id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM issues WHERE id = ?1",
                params![issue_id],
                |row| row.get(0),
            )
            .optional()
            .context("existence check failed")?;
        Ok(found.is_some())
    }

    /// One past the highest all-digit id, starting at 1 on an empty table.
    pub fn next_numeric_id(&self) -> Result<i64> {
        let max: Option<i64> = self
            .conn
            .query_row(
                "SELECT MAX(CAST(id AS INTEGER)) FROM issues WHERE id GLOB '[0-9]*'",
                [],
                |row| row.get(0),
            )
            .context("cannot compute next id")?;
        Ok(max.unwrap_or(0) + 1)
    }

    // ── queries ───────────────────────────────────────────────────────

    /// Filtered listing ordered by priority, then discovery date.
    pub fn query_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(id) = &filter.id {
            conditions.push("id = ?".into());
            values.push(Box::new(id.clone()));
        }
        if let Some(priority) = &filter.priority {
            conditions.push("priority = ?".into());
            values.push(Box::new(priority.clone()));
        }
        if let Some(status) = &filter.status {
            conditions.push("status = ?".into());
            values.push(Box::new(status.clone()));
        }
        if let Some(phase) = &filter.phase {
            conditions.push("phase = ?".into());
            values.push(Box::new(phase.clone()));
        }
        if let Some(github_issue_id) = filter.github_issue_id {
            conditions.push("github_issue_id = ?".into());
            values.push(Box::new(github_issue_id));
        }
        if let Some(glob) = &filter.file_glob {
            // file_path may hold several comma-separated paths, so the glob
            // matches anywhere in the field.
            let like = glob.replace('*', "%").replace('?', "_");
            conditions.push("file_path LIKE ?".into());
            values.push(Box::new(format!("%{like}%")));
        }

        let where_sql = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };
        let sql = format!(
            "SELECT * FROM issues WHERE {where_sql} ORDER BY priority ASC, discovery_date ASC"
        );

        let mut stmt = self.conn.prepare(&sql).context("query preparation failed")?;
        let rows = stmt
            .query_map(params_from_iter(values.iter().map(|v| v.as_ref())), row_to_issue)
            .context("query failed")?;
        let mut issues = Vec::new();
        for row in rows {
            issues.push(row.context("row decoding failed")?);
        }
        Ok(issues)
    }

    pub fn stats(&self) -> Result<Stats> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .context("count failed")?;

        let mut stats = Stats {
            total,
            ..Stats::default()
        };

        let mut stmt = self
            .conn
            .prepare("SELECT priority, COUNT(*) FROM issues GROUP BY priority")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            stats.by_priority.insert(row.get(0)?, row.get(1)?);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM issues GROUP BY status")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            stats.by_status.insert(row.get(0)?, row.get(1)?);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT priority, status, COUNT(*) FROM issues GROUP BY priority, status")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let priority: String = row.get(0)?;
            let status: String = row.get(1)?;
            let count: i64 = row.get(2)?;
            stats
                .by_priority_detail
                .entry(priority)
                .or_default()
                .insert(status, count);
        }

        Ok(stats)
    }

    // ── GitHub sync ───────────────────────────────────────────────────

    /// Fixed issues linked to a GitHub issue that have no successful close
    /// recorded yet.
    pub fn pending_github_sync(&self) -> Result<Vec<Issue>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.* FROM issues i
             WHERE i.status = 'fixed'
               AND i.github_issue_id IS NOT NULL
               AND NOT EXISTS (
                   SELECT 1 FROM github_sync_log g
                   WHERE g.issue_id = i.id
                     AND g.action = 'close'
                     AND g.status = 'success'
               )",
        )?;
        let rows = stmt.query_map([], row_to_issue)?;
        let mut issues = Vec::new();
        for row in rows {
            issues.push(row.context("row decoding failed")?);
        }
        Ok(issues)
    }

    pub fn log_github_sync(
        &self,
        issue_id: &str,
        github_issue_id: i64,
        action: &str,
        status: &str,
        error_msg: Option<&str>,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO github_sync_log
                   (issue_id, github_issue_id, action, status, error_msg)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![issue_id, github_issue_id, action, status, error_msg],
            )
            .context("cannot write sync log")?;
        Ok(())
    }

    pub fn sync_log(&self) -> Result<Vec<SyncLogEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, issue_id, github_issue_id, action, status, error_msg, synced_at
                      FROM github_sync_log ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(SyncLogEntry {
                id: row.get(0)?,
                issue_id: row.get(1)?,
                github_issue_id: row.get(2)?,
                action: row.get(3)?,
                status: row.get(4)?,
                error_msg: row.get(5)?,
                synced_at: row.get(6)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.context("row decoding failed")?);
        }
        Ok(entries)
    }
}

fn row_to_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get("id")?,
        title: row.get("title")?,
        priority: row.get("priority")?,
        status: row.get("status")?,
        discovery_date: row.get("discovery_date")?,
        fix_date: row.get("fix_date")?,
        file_path: row.get("file_path")?,
        location: row.get("location")?,
        description: row.get("description")?,
        impact: row.get("impact")?,
        fix_plan: row.get("fix_plan")?,
        estimated_hours: row.get("estimated_hours")?,
        actual_hours: row.get("actual_hours")?,
        phase: row.get("phase")?,
        github_issue_id: row.get("github_issue_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn issue(id: &str, priority: &str, status: &str) -> Issue {
        Issue {
            id: id.into(),
            title: format!("issue {id}"),
            priority: priority.into(),
            status: status.into(),
            discovery_date: "2026-01-15".into(),
            ..Issue::default()
        }
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.add_issue(&issue("001", "P0", "pending")).unwrap();
        db.add_issue(&issue("002", "P1", "fixed")).unwrap();
        db.add_issue(&issue("003", "P1", "pending")).unwrap();
        db
    }

    #[test]
    fn add_then_get_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let mut original = issue("042", "P2", "pending");
        original.estimated_hours = Some(2.5);
        original.github_issue_id = Some(77);
        db.add_issue(&original).unwrap();

        let mut loaded = db.get_issue("042").unwrap().unwrap();
        // Timestamps are set by the database.
        assert!(loaded.created_at.is_some());
        loaded.created_at = None;
        loaded.updated_at = None;
        assert_eq!(loaded, original);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let db = seeded();
        assert!(db.add_issue(&issue("001", "P3", "pending")).is_err());
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let db = seeded();
        let mut replacement = issue("001", "P3", "fixed");
        replacement.title = "rewritten".into();
        db.upsert_issue(&replacement).unwrap();
        let loaded = db.get_issue("001").unwrap().unwrap();
        assert_eq!(loaded.title, "rewritten");
        assert_eq!(loaded.priority, "P3");
    }

    #[test]
    fn update_changes_only_requested_fields() {
        let db = seeded();
        let update = IssueUpdate {
            status: Some("fixed".into()),
            fix_date: Some("2026-02-01".into()),
            ..IssueUpdate::default()
        };
        assert!(db.update_issue("001", &update).unwrap());

        let loaded = db.get_issue("001").unwrap().unwrap();
        assert_eq!(loaded.status, "fixed");
        assert_eq!(loaded.fix_date.as_deref(), Some("2026-02-01"));
        assert_eq!(loaded.title, "issue 001");
    }

    #[test]
    fn update_missing_id_reports_no_change() {
        let db = seeded();
        let update = IssueUpdate {
            status: Some("fixed".into()),
            ..IssueUpdate::default()
        };
        assert!(!db.update_issue("999", &update).unwrap());
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let db = seeded();
        assert!(!db.update_issue("001", &IssueUpdate::default()).unwrap());
    }

    #[test]
    fn delete_and_exists() {
        let db = seeded();
        assert!(db.issue_exists("002").unwrap());
        assert!(db.delete_issue("002").unwrap());
        assert!(!db.issue_exists("002").unwrap());
        assert!(!db.delete_issue("002").unwrap());
    }

    #[test]
    fn next_numeric_id_counts_past_the_max() {
        let db = seeded();
        assert_eq!(db.next_numeric_id().unwrap(), 4);
        assert_eq!(Database::open_in_memory().unwrap().next_numeric_id().unwrap(), 1);
    }

    #[test]
    fn query_filters_compose() {
        let db = seeded();
        let filter = IssueFilter {
            priority: Some("P1".into()),
            status: Some("pending".into()),
            ..IssueFilter::default()
        };
        let found = db.query_issues(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "003");
    }

    #[test]
    fn file_glob_translates_to_like() {
        let db = Database::open_in_memory().unwrap();
        let mut one = issue("010", "P1", "pending");
        one.file_path = Some("src/hal/gpio.c, src/hal/spi.c".into());
        db.add_issue(&one).unwrap();
        let mut two = issue("011", "P1", "pending");
        two.file_path = Some("src/core/init.c".into());
        db.add_issue(&two).unwrap();

        let filter = IssueFilter {
            file_glob: Some("src/hal/*".into()),
            ..IssueFilter::default()
        };
        let found = db.query_issues(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "010");
    }

    #[test]
    fn stats_aggregate_by_priority_and_status() {
        let db = seeded();
        let stats = db.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_priority.get("P1"), Some(&2));
        assert_eq!(stats.by_status.get("pending"), Some(&2));
        assert_eq!(
            stats.by_priority_detail.get("P1").and_then(|m| m.get("fixed")),
            Some(&1)
        );
    }

    #[test]
    fn pending_sync_skips_already_closed_issues() {
        let db = Database::open_in_memory().unwrap();
        let mut linked = issue("001", "P0", "fixed");
        linked.github_issue_id = Some(11);
        db.add_issue(&linked).unwrap();
        let mut closed = issue("002", "P0", "fixed");
        closed.github_issue_id = Some(12);
        db.add_issue(&closed).unwrap();
        let unlinked = issue("003", "P0", "fixed");
        db.add_issue(&unlinked).unwrap();
        let open = issue("004", "P0", "pending");
        db.add_issue(&open).unwrap();

        db.log_github_sync("002", 12, "close", "success", None).unwrap();
        // A failed attempt does not count as synced.
        db.log_github_sync("001", 11, "close", "failed", Some("timeout"))
            .unwrap();

        let pending = db.pending_github_sync().unwrap();
        let ids: Vec<_> = pending.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["001"]);
    }

    #[test]
    fn sync_log_round_trips() {
        let db = seeded();
        db.log_github_sync("002", 42, "close", "success", None).unwrap();
        let log = db.sync_log().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].issue_id, "002");
        assert_eq!(log[0].github_issue_id, 42);
        assert_eq!(log[0].status, "success");
        assert!(log[0].synced_at.is_some());
    }
}
