//! Guided project creation and the settings edit session.
//!
//! Editing never touches the file until Submit: the parsed config is
//! wrapped in an [`EditSession`], sub-editors mutate the working copy, and
//! the persistence callback runs at most once with the finished record.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::paths::config_dir;
use crate::config::{sanitize_name, GlobalDefaults, ProjectFile};
use crate::session::{EditSession, SessionOutcome};
use crate::term::{self, Console, KeyInput, Menu, MenuItem, Style, UiError};

const MENU_FOOTER: &str = "↑/↓ move · Enter select · Esc cancel";

/// Save callback used by the interactive flows.
pub type Persist<'a> = &'a mut dyn FnMut(&ProjectFile) -> Result<()>;

/// Write the project file where it lives and refresh the registered copy
/// under the config dir so the management menu can find it.
pub fn persist_project(path: &Path, file: &ProjectFile) -> Result<()> {
    file.save(path)?;
    let registry = config_dir();
    fs::create_dir_all(&registry)
        .with_context(|| format!("cannot create {}", registry.display()))?;
    file.save(&registry.join(file.registry_file_name()))?;
    debug!(path = %path.display(), "project config persisted");
    Ok(())
}

// Fixed indices into the settings menu below.
const OPT_VIEW: usize = 0;
const OPT_INFO: usize = 1;
const OPT_PRIORITIES: usize = 2;
const OPT_STATUSES: usize = 3;
const OPT_GITHUB: usize = 4;
const OPT_EXPORT: usize = 5;
const OPT_SUBMIT: usize = 7;
const OPT_CANCEL: usize = 8;

/// Interactive edit session over an existing project record.
///
/// Returns how the session ended; a failing `persist` aborts the session
/// with an error after telling the user nothing was saved.
pub fn edit_project<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    record: &ProjectFile,
    persist: Persist<'_>,
) -> Result<SessionOutcome> {
    let mut session = EditSession::new(record);
    loop {
        let base = format!(
            "Project settings — {} ({})",
            session.working().project.name,
            session.working().project.id
        );
        let menu = Menu::new(
            session.title(&base),
            vec![
                MenuItem::item("View as YAML"),
                MenuItem::item("Project info"),
                MenuItem::item("Priorities"),
                MenuItem::item("Statuses"),
                MenuItem::item("GitHub settings"),
                MenuItem::item("Export settings"),
                MenuItem::Separator,
                MenuItem::styled("Submit", Style::Green),
                MenuItem::styled("Cancel", Style::Red),
            ],
        )
        .with_footer(MENU_FOOTER);

        match console.menu(&menu)? {
            None | Some(OPT_CANCEL) => {
                debug!("edit session discarded");
                return Ok(SessionOutcome::Discarded);
            }
            Some(OPT_SUBMIT) => {
                if let Err(save_err) = persist(session.working()) {
                    writeln!(
                        console.writer(),
                        "  {}",
                        term::err(&format!("✗ not saved: {save_err:#}"))
                    )?;
                    return Err(save_err.context("project settings were not saved"));
                }
                writeln!(console.writer(), "  {}", term::ok("✓ saved"))?;
                return Ok(SessionOutcome::Saved);
            }
            Some(OPT_VIEW) => view_yaml(console, session.working())?,
            Some(OPT_INFO) => edit_project_info(console, session.working_mut())?,
            Some(OPT_PRIORITIES) => {
                if let Some(list) = edit_list(console, "Priorities", &session.working().priorities)?
                {
                    session.working_mut().priorities = list;
                }
            }
            Some(OPT_STATUSES) => {
                if let Some(list) = edit_list(console, "Statuses", &session.working().statuses)? {
                    session.working_mut().statuses = list;
                }
            }
            Some(OPT_GITHUB) => edit_github(console, &mut session)?,
            Some(OPT_EXPORT) => {
                let current = session.working().export.output.clone();
                if let Some(output) = console.text_line("Export output path", Some(&current))? {
                    session.working_mut().export.output = output;
                }
            }
            Some(_) => {}
        }
    }
}

fn view_yaml<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    working: &ProjectFile,
) -> Result<()> {
    let yaml = working.to_yaml()?;
    writeln!(console.writer())?;
    for line in yaml.lines() {
        writeln!(console.writer(), "  {line}")?;
    }
    writeln!(console.writer())?;
    console.wait_key("press any key to continue")?;
    Ok(())
}

/// Prompt for id and name; the working copy is only touched once both are
/// valid, so an aborted prompt leaves it as it was.
fn edit_project_info<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    working: &mut ProjectFile,
) -> Result<(), UiError> {
    let id = loop {
        match console.text_line("Project id (digits)", Some(&working.project.id))? {
            None => return Ok(()),
            Some(v) if !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()) => break v,
            Some(_) => writeln!(
                console.writer(),
                "  {}",
                term::err("✗ id must be a non-empty string of digits")
            )?,
        }
    };
    let name = loop {
        match console.text_line("Project name", Some(&working.project.name))? {
            None => return Ok(()),
            Some(v) if !v.trim().is_empty() => break v,
            Some(_) => writeln!(console.writer(), "  {}", term::err("✗ name must not be empty"))?,
        }
    };
    working.project.id = id;
    working.project.name = name;
    Ok(())
}

/// Comma-separated list editor. `None` means "keep what was there".
fn edit_list<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    prompt: &str,
    current: &[String],
) -> Result<Option<Vec<String>>, UiError> {
    let joined = current.join(",");
    let Some(raw) = console.text_line(&format!("{prompt} (comma-separated)"), Some(&joined))?
    else {
        return Ok(None);
    };
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if items.is_empty() {
        writeln!(
            console.writer(),
            "  {}",
            term::err("✗ list must not be empty — kept the current value")
        )?;
        return Ok(None);
    }
    Ok(Some(items))
}

const GH_TOGGLE: usize = 0;
const GH_REPO: usize = 1;
const GH_CLOSE: usize = 2;
const GH_TEMPLATE: usize = 3;
const GH_BACK: usize = 5;

fn edit_github<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    session: &mut EditSession<ProjectFile>,
) -> Result<()> {
    loop {
        let gh = &session.working().github;
        let menu = Menu::new(
            session.title("GitHub settings"),
            vec![
                MenuItem::item(format!("Sync enabled: {}", gh.enabled)),
                MenuItem::item(format!(
                    "Repository: {}",
                    gh.repo.as_deref().unwrap_or("(not bound)")
                )),
                MenuItem::item(format!("Close on fix: {}", gh.close_on_fix)),
                MenuItem::item(format!("Comment template: {}", gh.comment_template)),
                MenuItem::Separator,
                MenuItem::styled("Back", Style::Red),
            ],
        )
        .with_footer(MENU_FOOTER);

        match console.menu(&menu)? {
            None | Some(GH_BACK) => return Ok(()),
            Some(GH_TOGGLE) => {
                let gh = &mut session.working_mut().github;
                gh.enabled = !gh.enabled;
            }
            Some(GH_REPO) => {
                match console.text_line("GitHub repository (owner/name, empty clears)", None)? {
                    Some(repo) => session.working_mut().github.repo = Some(repo),
                    None => session.working_mut().github.repo = None,
                }
            }
            Some(GH_CLOSE) => {
                let gh = &mut session.working_mut().github;
                gh.close_on_fix = !gh.close_on_fix;
            }
            Some(GH_TEMPLATE) => {
                let current = session.working().github.comment_template.clone();
                if let Some(template) =
                    console.text_line("Comment template ({issue_id} placeholder)", Some(&current))?
                {
                    session.working_mut().github.comment_template = template;
                }
            }
            Some(_) => {}
        }
    }
}

/// Guided creation of a new project file. Returns the created record, or
/// `None` when the user backs out at any required step.
pub fn guided_create<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    defaults: &GlobalDefaults,
    config_path: &Path,
    persist: Persist<'_>,
) -> Result<Option<ProjectFile>> {
    let width = term::term_width();
    for line in term::section_header("New project setup", width) {
        writeln!(console.writer(), "{line}")?;
    }

    let id = loop {
        match console.text_line("Project id (digits, e.g. 001)", None)? {
            None => return cancelled(console),
            Some(v) if v.chars().all(|c| c.is_ascii_digit()) => break v,
            Some(_) => writeln!(
                console.writer(),
                "  {}",
                term::err("✗ id must be a non-empty string of digits")
            )?,
        }
    };
    let name = loop {
        match console.text_line("Project name", None)? {
            None => return cancelled(console),
            Some(v) if !v.trim().is_empty() => break v,
            Some(_) => writeln!(console.writer(), "  {}", term::err("✗ name must not be empty"))?,
        }
    };

    let mut file = ProjectFile::seeded(id, name, defaults);
    if let Some(list) = edit_list(console, "Priorities", &file.priorities)? {
        file.priorities = list;
    }
    if let Some(list) = edit_list(console, "Statuses", &file.statuses)? {
        file.statuses = list;
    }

    let Some(gh_enabled) = console.confirm("Enable GitHub sync?", false)? else {
        return cancelled(console);
    };
    file.github.enabled = gh_enabled;
    if gh_enabled {
        let Some(close_on_fix) = console.confirm("Close GitHub issues on fix?", true)? else {
            return cancelled(console);
        };
        file.github.close_on_fix = close_on_fix;
        if let Some(template) =
            console.text_line("Close comment template", Some(&file.github.comment_template))?
        {
            file.github.comment_template = template;
        }
        if let Some(repo) = console.text_line("GitHub repository (owner/name, optional)", None)? {
            file.github.repo = Some(repo);
        }
    }

    let default_export = format!(
        "exports/{}_issues.md",
        sanitize_name(&file.project.name).to_lowercase()
    );
    if let Some(output) = console.text_line("Export output path", Some(&default_export))? {
        file.export.output = output;
    }

    // Preview before anything is written.
    writeln!(console.writer())?;
    writeln!(console.writer(), "{}", term::hr(width))?;
    for line in file.to_yaml()?.lines() {
        writeln!(console.writer(), "  {line}")?;
    }
    writeln!(console.writer(), "{}", term::hr(width))?;
    writeln!(
        console.writer(),
        "{}",
        term::kv("Write to", &config_path.display().to_string())
    )?;
    if config_path.is_file() {
        writeln!(
            console.writer(),
            "  {}",
            term::warn("⚠ file exists and will be overwritten")
        )?;
    }

    match console.confirm("Write configuration?", false)? {
        Some(true) => {}
        _ => return cancelled(console),
    }

    persist(&file)?;
    writeln!(
        console.writer(),
        "  {}",
        term::ok(&format!("✓ created {}", config_path.display()))
    )?;
    Ok(Some(file))
}

fn cancelled<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
) -> Result<Option<ProjectFile>> {
    writeln!(console.writer(), "  {}", term::dim("Cancelled."))?;
    Ok(None)
}
