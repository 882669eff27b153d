//! XDG base-directory resolution for config, data, exports, and backups.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Per-project configuration file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "issue-tracker.yaml";

const APP_DIR: &str = "issue-tracker";

fn base_dir(xdg_var: &str, fallback: impl FnOnce() -> Option<PathBuf>) -> PathBuf {
    if let Some(base) = env::var_os(xdg_var).filter(|v| !v.is_empty()) {
        return PathBuf::from(base);
    }
    fallback().unwrap_or_else(|| PathBuf::from("."))
}

/// `$XDG_CONFIG_HOME/issue-tracker` (default `~/.config/issue-tracker`).
pub fn config_dir() -> PathBuf {
    base_dir("XDG_CONFIG_HOME", dirs::config_dir).join(APP_DIR)
}

/// `$XDG_DATA_HOME/issue-tracker` (default `~/.local/share/issue-tracker`).
pub fn data_dir() -> PathBuf {
    base_dir("XDG_DATA_HOME", dirs::data_dir).join(APP_DIR)
}

pub fn exports_dir() -> PathBuf {
    data_dir().join("exports")
}

pub fn backups_dir() -> PathBuf {
    data_dir().join("backups")
}

/// Create the config/data/exports/backups directories if absent.
pub fn ensure_directories() -> io::Result<()> {
    for dir in [config_dir(), data_dir(), exports_dir(), backups_dir()] {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// The project config in `directory`, if one exists.
pub fn find_config_in_dir(directory: &Path) -> Option<PathBuf> {
    let candidate = directory.join(CONFIG_FILENAME);
    candidate.is_file().then_some(candidate)
}
