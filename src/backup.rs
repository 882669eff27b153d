//! Project snapshots: registered config + database copied into a
//! timestamped directory under the backups dir, and back.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::Deserialize;
use tracing::debug;

use crate::config::paths::{backups_dir, config_dir, data_dir};

/// A project registered in the config dir (one yaml per project).
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredProject {
    pub path: PathBuf,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectHead {
    #[serde(default)]
    project: ProjectHeadInner,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectHeadInner {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// All project files registered under `dir` (`globals.yaml` excluded).
/// Unparseable files are listed with placeholder fields rather than
/// aborting the scan.
pub fn scan_projects_in(dir: &Path) -> Result<Vec<RegisteredProject>> {
    let mut projects = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(projects),
    };
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".yaml") || name == "globals.yaml" {
            continue;
        }
        let head: ProjectHead = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_yaml::from_str(&raw).ok())
            .unwrap_or(ProjectHead {
                project: ProjectHeadInner::default(),
            });
        projects.push(RegisteredProject {
            id: head.project.id.unwrap_or_else(|| "?".to_string()),
            name: head
                .project
                .name
                .unwrap_or_else(|| name.trim_end_matches(".yaml").to_string()),
            path,
        });
    }
    projects.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(projects)
}

pub fn scan_projects() -> Result<Vec<RegisteredProject>> {
    scan_projects_in(&config_dir())
}

/// The database file belonging to a registered project, if one exists.
pub fn find_database_in(data: &Path, project_id: &str) -> Option<PathBuf> {
    let prefix = format!("{project_id}_");
    let entries = fs::read_dir(data).ok()?;
    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "db")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

pub fn find_database(project_id: &str) -> Option<PathBuf> {
    find_database_in(&data_dir(), project_id)
}

/// One snapshot directory under the backups dir.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: PathBuf,
    pub name: String,
}

/// Copy the project's config (and database, when present) into a fresh
/// timestamped snapshot directory. Returns the snapshot path.
pub fn backup_project_in(
    backups: &Path,
    project: &RegisteredProject,
    database: Option<&Path>,
) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let snapshot = backups.join(format!("{}_{}_{stamp}", project.id, project.name));
    fs::create_dir_all(&snapshot)
        .with_context(|| format!("cannot create {}", snapshot.display()))?;

    let config_target = snapshot.join(
        project
            .path
            .file_name()
            .context("project path has no file name")?,
    );
    fs::copy(&project.path, &config_target)
        .with_context(|| format!("cannot copy {}", project.path.display()))?;

    if let Some(db) = database {
        let db_target = snapshot.join(db.file_name().context("database path has no file name")?);
        fs::copy(db, &db_target).with_context(|| format!("cannot copy {}", db.display()))?;
    }

    debug!(snapshot = %snapshot.display(), "backup written");
    Ok(snapshot)
}

pub fn backup_project(project: &RegisteredProject, database: Option<&Path>) -> Result<PathBuf> {
    backup_project_in(&backups_dir(), project, database)
}

/// Snapshots sorted by name (the timestamp suffix makes that chronological).
pub fn list_snapshots_in(backups: &Path) -> Result<Vec<Snapshot>> {
    let mut snapshots = Vec::new();
    let entries = match fs::read_dir(backups) {
        Ok(entries) => entries,
        Err(_) => return Ok(snapshots),
    };
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        snapshots.push(Snapshot {
            name: name.to_string(),
            path,
        });
    }
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(snapshots)
}

pub fn list_snapshots() -> Result<Vec<Snapshot>> {
    list_snapshots_in(&backups_dir())
}

/// Files inside a snapshot and where each would be restored to.
pub fn restore_plan_in(
    snapshot: &Snapshot,
    config: &Path,
    data: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut plan = Vec::new();
    for entry in fs::read_dir(&snapshot.path)
        .with_context(|| format!("cannot read snapshot {}", snapshot.path.display()))?
    {
        let source = entry?.path();
        let Some(name) = source.file_name().map(|n| n.to_os_string()) else {
            continue;
        };
        let dest_dir = if source.extension().is_some_and(|ext| ext == "yaml") {
            config
        } else {
            data
        };
        plan.push((source, dest_dir.join(name)));
    }
    if plan.is_empty() {
        bail!("snapshot {} is empty", snapshot.name);
    }
    plan.sort();
    Ok(plan)
}

pub fn restore_plan(snapshot: &Snapshot) -> Result<Vec<(PathBuf, PathBuf)>> {
    restore_plan_in(snapshot, &config_dir(), &data_dir())
}

/// Execute a restore plan, overwriting existing files.
pub fn restore(plan: &[(PathBuf, PathBuf)]) -> Result<()> {
    for (source, dest) in plan {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        fs::copy(source, dest)
            .with_context(|| format!("cannot restore {}", dest.display()))?;
        debug!(dest = %dest.display(), "restored");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scan_skips_globals_and_tolerates_junk() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("001_demo.yaml"),
            "project:\n  id: \"001\"\n  name: demo\n",
        );
        write(&tmp.path().join("globals.yaml"), "defaults: {}\n");
        write(&tmp.path().join("broken.yaml"), ":::: not yaml ::::");
        write(&tmp.path().join("notes.txt"), "ignored");

        let projects = scan_projects_in(tmp.path()).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, "001");
        assert_eq!(projects[0].name, "demo");
        // Broken files keep their placeholder identity.
        assert_eq!(projects[1].id, "?");
        assert_eq!(projects[1].name, "broken");
    }

    #[test]
    fn find_database_matches_project_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("001_demo.db"), "");
        write(&tmp.path().join("002_other.db"), "");
        let found = find_database_in(tmp.path(), "001").unwrap();
        assert!(found.ends_with("001_demo.db"));
        assert_eq!(find_database_in(tmp.path(), "003"), None);
    }

    #[test]
    fn backup_then_restore_round_trips_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config_dir = tmp.path().join("config");
        let data_dir = tmp.path().join("data");
        let backups = tmp.path().join("backups");
        fs::create_dir_all(&config_dir).unwrap();
        fs::create_dir_all(&data_dir).unwrap();

        let yaml = config_dir.join("001_demo.yaml");
        write(&yaml, "project:\n  id: \"001\"\n  name: demo\n");
        let db = data_dir.join("001_demo.db");
        write(&db, "sqlite-bytes");

        let project = RegisteredProject {
            path: yaml.clone(),
            id: "001".into(),
            name: "demo".into(),
        };
        let snapshot_path = backup_project_in(&backups, &project, Some(&db)).unwrap();
        assert!(snapshot_path.join("001_demo.yaml").is_file());
        assert!(snapshot_path.join("001_demo.db").is_file());

        // Wipe the originals, then restore from the snapshot.
        fs::remove_file(&yaml).unwrap();
        fs::remove_file(&db).unwrap();

        let snapshots = list_snapshots_in(&backups).unwrap();
        assert_eq!(snapshots.len(), 1);
        let plan = restore_plan_in(&snapshots[0], &config_dir, &data_dir).unwrap();
        assert_eq!(plan.len(), 2);
        restore(&plan).unwrap();

        assert!(yaml.is_file());
        assert_eq!(fs::read_to_string(&db).unwrap(), "sqlite-bytes");
    }

    #[test]
    fn restore_plan_rejects_empty_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let empty = tmp.path().join("empty_snap");
        fs::create_dir_all(&empty).unwrap();
        let snapshot = Snapshot {
            path: empty,
            name: "empty_snap".into(),
        };
        assert!(restore_plan_in(&snapshot, tmp.path(), tmp.path()).is_err());
    }
}
