//! Tool-wide defaults stored in `globals.yaml` under the config dir.
//!
//! Values present in the file win over the built-ins; the file is created
//! on first save.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::paths::config_dir;
use super::{DEFAULT_COMMENT_TEMPLATE, DEFAULT_PRIORITIES, DEFAULT_STATUSES};

const GLOBALS_FILENAME: &str = "globals.yaml";

/// The resolved defaults handed to project creation and the globals editor.
/// Structural equality makes it usable as an edit-session record.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDefaults {
    pub priorities: Vec<String>,
    pub statuses: Vec<String>,
    pub github_comment_template: String,
}

impl GlobalDefaults {
    pub fn builtin() -> Self {
        GlobalDefaults {
            priorities: DEFAULT_PRIORITIES.iter().map(|s| s.to_string()).collect(),
            statuses: DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect(),
            github_comment_template: DEFAULT_COMMENT_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GlobalsFile {
    #[serde(default)]
    defaults: StoredDefaults,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priorities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    statuses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    github_comment_template: Option<String>,
}

#[derive(Debug)]
pub struct GlobalConfig {
    path: PathBuf,
    file: GlobalsFile,
}

impl GlobalConfig {
    /// Load from the standard location; a missing file is an empty config.
    pub fn load() -> Result<Self> {
        Self::load_from(config_dir().join(GLOBALS_FILENAME))
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        let file = if path.is_file() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("invalid globals file: {}", path.display()))?
        } else {
            GlobalsFile::default()
        };
        Ok(GlobalConfig { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored values with built-in fallbacks filled in.
    pub fn defaults(&self) -> GlobalDefaults {
        let builtin = GlobalDefaults::builtin();
        GlobalDefaults {
            priorities: self
                .file
                .defaults
                .priorities
                .clone()
                .unwrap_or(builtin.priorities),
            statuses: self
                .file
                .defaults
                .statuses
                .clone()
                .unwrap_or(builtin.statuses),
            github_comment_template: self
                .file
                .defaults
                .github_comment_template
                .clone()
                .unwrap_or(builtin.github_comment_template),
        }
    }

    /// Replace the stored defaults wholesale and write the file.
    pub fn save_defaults(&mut self, defaults: &GlobalDefaults) -> Result<()> {
        self.file.defaults = StoredDefaults {
            priorities: Some(defaults.priorities.clone()),
            statuses: Some(defaults.statuses.clone()),
            github_comment_template: Some(defaults.github_comment_template.clone()),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let rendered = serde_yaml::to_string(&self.file).context("globals serialization failed")?;
        fs::write(&self.path, rendered)
            .with_context(|| format!("cannot write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_resolves_to_builtins() {
        let tmp = tempfile::tempdir().unwrap();
        let config = GlobalConfig::load_from(tmp.path().join("globals.yaml")).unwrap();
        assert_eq!(config.defaults(), GlobalDefaults::builtin());
    }

    #[test]
    fn stored_values_override_builtins_per_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("globals.yaml");
        fs::write(&path, "defaults:\n  priorities: [high, low]\n").unwrap();
        let defaults = GlobalConfig::load_from(path).unwrap().defaults();
        assert_eq!(defaults.priorities, vec!["high", "low"]);
        // Untouched keys keep the built-in values.
        assert_eq!(defaults.statuses, GlobalDefaults::builtin().statuses);
    }

    #[test]
    fn save_round_trips_and_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("globals.yaml");
        let mut config = GlobalConfig::load_from(path.clone()).unwrap();
        let mut defaults = GlobalDefaults::builtin();
        defaults.github_comment_template = "done: {issue_id}".to_string();
        config.save_defaults(&defaults).unwrap();

        let reloaded = GlobalConfig::load_from(path).unwrap();
        assert_eq!(reloaded.defaults(), defaults);
    }
}
