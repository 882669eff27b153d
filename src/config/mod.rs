//! Project configuration: the `issue-tracker.yaml` record, its validation,
//! and load/save.
//!
//! The whole file round-trips through one serde type that also serves as
//! the edit-session record, so "dirty" is plain structural inequality.

mod global;
pub mod paths;

pub use global::{GlobalConfig, GlobalDefaults};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_PRIORITIES: &[&str] = &["P0", "P1", "P2", "P3"];
pub const DEFAULT_STATUSES: &[&str] = &["pending", "in_progress", "planned", "fixed", "n_a"];
pub const DEFAULT_COMMENT_TEMPLATE: &str = "Auto-sync: {issue_id} fixed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub project: ProjectInfo,
    #[serde(default)]
    pub id_rules: IdRules,
    pub priorities: Vec<String>,
    pub statuses: Vec<String>,
    #[serde(default)]
    pub github: GithubSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdRules {
    pub format: String,
}

impl Default for IdRules {
    fn default() -> Self {
        IdRules {
            format: "{num:03}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubSettings {
    pub enabled: bool,
    pub close_on_fix: bool,
    pub comment_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        GithubSettings {
            enabled: false,
            close_on_fix: false,
            comment_template: DEFAULT_COMMENT_TEMPLATE.to_string(),
            repo: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub output: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            output: "exports/issues.md".to_string(),
        }
    }
}

impl ProjectFile {
    /// A fresh record seeded from the global defaults.
    pub fn seeded(id: String, name: String, defaults: &GlobalDefaults) -> Self {
        ProjectFile {
            project: ProjectInfo { id, name },
            id_rules: IdRules::default(),
            priorities: defaults.priorities.clone(),
            statuses: defaults.statuses.clone(),
            github: GithubSettings {
                comment_template: defaults.github_comment_template.clone(),
                ..GithubSettings::default()
            },
            export: ExportSettings::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("config not found: {}", path.display()))?;
        let file: ProjectFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        file.validate()?;
        Ok(file)
    }

    /// Write the whole record. Only ever called with a fully-formed value;
    /// the edit session hands over its working copy at submit, never a
    /// partial state.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let rendered = self.to_yaml()?;
        fs::write(path, rendered)
            .with_context(|| format!("cannot write config: {}", path.display()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("config serialization failed")
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.id.is_empty() || !self.project.id.chars().all(|c| c.is_ascii_digit()) {
            bail!("project.id must be a non-empty string of digits");
        }
        if self.project.name.trim().is_empty() {
            bail!("project.name must not be empty");
        }
        if self.priorities.is_empty() {
            bail!("priorities must be a non-empty list");
        }
        if self.statuses.is_empty() {
            bail!("statuses must be a non-empty list");
        }
        Ok(())
    }

    pub fn is_valid_priority(&self, priority: &str) -> bool {
        self.priorities.iter().any(|p| p == priority)
    }

    pub fn is_valid_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    /// Issue ids are plain digit strings under the current id rules.
    pub fn is_valid_id(&self, issue_id: &str) -> bool {
        !issue_id.is_empty() && issue_id.chars().all(|c| c.is_ascii_digit())
    }

    /// File name of this project's database under the data dir.
    pub fn db_file_name(&self) -> String {
        format!(
            "{}_{}.db",
            self.project.id,
            sanitize_name(&self.project.name).to_lowercase()
        )
    }

    /// File name of this project's registered copy under the config dir.
    pub fn registry_file_name(&self) -> String {
        format!(
            "{}_{}.yaml",
            self.project.id,
            sanitize_name(&self.project.name).to_lowercase()
        )
    }
}

/// Keep letters, digits, and underscores; everything else becomes an
/// underscore, with the ends trimmed.
pub fn sanitize_name(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    mapped.trim_matches('_').to_string()
}
