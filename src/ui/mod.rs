//! Management menus behind `iss ui`.
//!
//! Every screen is a widget-layer menu; Esc backs out one level and Ctrl-C
//! unwinds the whole stack. The globals editor reuses the same edit-session
//! protocol as the project editor.

pub mod project;

use std::env;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::backup::{
    backup_project, find_database, list_snapshots, restore, restore_plan, scan_projects,
};
use crate::config::paths::{backups_dir, config_dir, data_dir, find_config_in_dir};
use crate::config::{GlobalConfig, GlobalDefaults, ProjectFile};
use crate::github;
use crate::session::{EditSession, SessionOutcome};
use crate::term::{self, Console, KeyInput, Menu, MenuItem, Style};

const MENU_FOOTER: &str = "↑/↓ move · Enter select · Esc back";

/// Top-level management menu. Loops until Quit or Esc.
pub fn main_menu<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    loop {
        let cwd = env::current_dir()?;
        let cwd_config = find_config_in_dir(&cwd);

        let mut items = vec![
            MenuItem::item("Paths"),
            MenuItem::item("Global defaults"),
            MenuItem::item("Environment"),
            MenuItem::item("Projects"),
            MenuItem::item("GitHub"),
        ];
        if cwd_config.is_some() {
            items.push(MenuItem::item("Current project settings"));
        }
        let quit_index = items.len() + 1;
        items.push(MenuItem::Separator);
        items.push(MenuItem::styled("Quit", Style::Red));

        let width = term::term_width();
        let menu = Menu::new("Issue Tracker — management", items)
            .with_header(vec![term::banner_line(
                &format!("Issue Tracker v{}", env!("CARGO_PKG_VERSION")),
                width,
            )])
            .with_footer(MENU_FOOTER);

        match console.menu(&menu)? {
            None => return Ok(()),
            Some(idx) if idx == quit_index => return Ok(()),
            Some(0) => show_paths(console)?,
            Some(1) => edit_globals(console)?,
            Some(2) => show_environment(console)?,
            Some(3) => projects_menu(console)?,
            Some(4) => github_menu(console)?,
            Some(5) => {
                if let Some(path) = &cwd_config {
                    edit_current_project(console, path)?;
                }
            }
            Some(_) => {}
        }
    }
}

fn flag(exists: bool) -> &'static str {
    if exists {
        "✓"
    } else {
        "✗"
    }
}

fn show_paths<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    let config = config_dir();
    let data = data_dir();
    let backups = backups_dir();
    let cwd = env::current_dir()?;
    let cwd_config = find_config_in_dir(&cwd);

    let out = console.writer();
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        term::kv("Config dir", &format!("{}  [{}]", config.display(), flag(config.is_dir())))
    )?;
    writeln!(
        out,
        "{}",
        term::kv("Data dir", &format!("{}  [{}]", data.display(), flag(data.is_dir())))
    )?;
    writeln!(
        out,
        "{}",
        term::kv(
            "Backups dir",
            &format!("{}  [{}]", backups.display(), flag(backups.is_dir()))
        )
    )?;
    writeln!(out)?;
    writeln!(out, "{}", term::kv("Working dir", &cwd.display().to_string()))?;
    match &cwd_config {
        Some(path) => writeln!(
            out,
            "{}",
            term::kv("Project config", &format!("{}  [✓]", path.display()))
        )?,
        None => writeln!(out, "{}", term::kv("Project config", "(not found)"))?,
    }
    writeln!(out)?;
    for var in ["XDG_CONFIG_HOME", "XDG_DATA_HOME"] {
        let shown = env::var(var).unwrap_or_else(|_| "(unset)".to_string());
        writeln!(out, "{}", term::kv(var, &shown))?;
    }
    writeln!(out)?;
    console.wait_key("press any key to continue")?;
    Ok(())
}

// Globals editor menu indices.
const GL_PRIORITIES: usize = 0;
const GL_STATUSES: usize = 1;
const GL_TEMPLATE: usize = 2;
const GL_SUBMIT: usize = 4;
const GL_CANCEL: usize = 5;

fn edit_globals<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    let mut global = GlobalConfig::load()?;
    let defaults = global.defaults();
    let mut persist = |edited: &GlobalDefaults| global.save_defaults(edited);
    match edit_globals_session(console, &defaults, &mut persist)? {
        SessionOutcome::Saved => debug!("global defaults saved"),
        SessionOutcome::Discarded => debug!("global defaults edit discarded"),
    }
    Ok(())
}

/// Edit session over the resolved global defaults; persistence runs at most
/// once on Submit.
pub fn edit_globals_session<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    defaults: &GlobalDefaults,
    persist: &mut dyn FnMut(&GlobalDefaults) -> Result<()>,
) -> Result<SessionOutcome> {
    let mut session = EditSession::new(defaults);
    loop {
        let working = session.working();
        let menu = Menu::new(
            session.title("Global defaults"),
            vec![
                MenuItem::item(format!("Priorities: {}", working.priorities.join(","))),
                MenuItem::item(format!("Statuses: {}", working.statuses.join(","))),
                MenuItem::item(format!(
                    "Comment template: {}",
                    working.github_comment_template
                )),
                MenuItem::Separator,
                MenuItem::styled("Submit", Style::Green),
                MenuItem::styled("Cancel", Style::Red),
            ],
        )
        .with_footer(MENU_FOOTER);

        match console.menu(&menu)? {
            None | Some(GL_CANCEL) => return Ok(SessionOutcome::Discarded),
            Some(GL_SUBMIT) => {
                if let Err(save_err) = persist(session.working()) {
                    writeln!(
                        console.writer(),
                        "  {}",
                        term::err(&format!("✗ not saved: {save_err:#}"))
                    )?;
                    return Err(save_err.context("global defaults were not saved"));
                }
                writeln!(console.writer(), "  {}", term::ok("✓ saved"))?;
                return Ok(SessionOutcome::Saved);
            }
            Some(GL_PRIORITIES) => {
                if let Some(list) =
                    edit_string_list(console, "Default priorities", &session.working().priorities)?
                {
                    session.working_mut().priorities = list;
                }
            }
            Some(GL_STATUSES) => {
                if let Some(list) =
                    edit_string_list(console, "Default statuses", &session.working().statuses)?
                {
                    session.working_mut().statuses = list;
                }
            }
            Some(GL_TEMPLATE) => {
                let current = session.working().github_comment_template.clone();
                if let Some(template) =
                    console.text_line("Comment template ({issue_id} placeholder)", Some(&current))?
                {
                    session.working_mut().github_comment_template = template;
                }
            }
            Some(_) => {}
        }
    }
}

fn edit_string_list<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    prompt: &str,
    current: &[String],
) -> Result<Option<Vec<String>>> {
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

fn show_environment<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
) -> Result<()> {
    let out = console.writer();
    writeln!(out)?;
    writeln!(out, "{}", term::kv("issue-tracker", env!("CARGO_PKG_VERSION")))?;
    match github::version() {
        Ok(version) => writeln!(out, "{}", term::kv("gh CLI", &format!("✓ ({version})")))?,
        Err(gh_err) => writeln!(out, "{}", term::kv("gh CLI", &format!("✗ {gh_err}")))?,
    }
    let globals = config_dir().join("globals.yaml");
    writeln!(
        out,
        "{}",
        term::kv(
            "Globals file",
            &format!("{}  [{}]", globals.display(), flag(globals.is_file()))
        )
    )?;
    writeln!(out)?;
    console.wait_key("press any key to continue")?;
    Ok(())
}

fn projects_menu<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    loop {
        let menu = Menu::new(
            "Projects",
            vec![
                MenuItem::item("List projects"),
                MenuItem::item("Back up a project"),
                MenuItem::item("Restore a snapshot"),
                MenuItem::Separator,
                MenuItem::styled("Back", Style::Red),
            ],
        )
        .with_footer(MENU_FOOTER);
        match console.menu(&menu)? {
            None | Some(4) => return Ok(()),
            Some(0) => list_projects(console)?,
            Some(1) => backup_flow(console)?,
            Some(2) => restore_flow(console)?,
            Some(_) => {}
        }
    }
}

fn list_projects<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    let projects = scan_projects()?;
    let out = console.writer();
    writeln!(out)?;
    if projects.is_empty() {
        writeln!(
            out,
            "  {}",
            term::dim("No registered projects. Run `iss project` in a project directory.")
        )?;
    }
    for project in &projects {
        writeln!(
            out,
            "  {}",
            term::value(&format!("[{}] {}", project.id, project.name))
        )?;
        writeln!(out, "    {}", term::dim(&format!("config:   {}", project.path.display())))?;
        match find_database(&project.id) {
            Some(db) => {
                writeln!(out, "    {}", term::dim(&format!("database: {}", db.display())))?
            }
            None => writeln!(out, "    {}", term::dim("database: (none)"))?,
        }
    }
    writeln!(out)?;
    console.wait_key("press any key to continue")?;
    Ok(())
}

fn backup_flow<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    let projects = scan_projects()?;
    if projects.is_empty() {
        writeln!(console.writer(), "  {}", term::warn("No projects to back up."))?;
        return Ok(());
    }
    let items: Vec<MenuItem> = projects
        .iter()
        .map(|p| MenuItem::item(format!("[{}] {}", p.id, p.name)))
        .collect();
    let menu = Menu::new("Back up which project?", items).with_footer(MENU_FOOTER);
    let Some(choice) = console.menu(&menu)? else {
        return Ok(());
    };

    let project = &projects[choice];
    let database = find_database(&project.id);
    if database.is_none() {
        writeln!(
            console.writer(),
            "  {}",
            term::warn(&format!(
                "⚠ project [{}] has no database file; backing up config only",
                project.id
            ))
        )?;
    }
    let snapshot = backup_project(project, database.as_deref())?;
    writeln!(
        console.writer(),
        "  {}",
        term::ok(&format!("✓ backed up to {}", snapshot.display()))
    )?;
    Ok(())
}

fn restore_flow<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    let snapshots = list_snapshots()?;
    if snapshots.is_empty() {
        writeln!(console.writer(), "  {}", term::warn("No snapshots available."))?;
        return Ok(());
    }
    let items: Vec<MenuItem> = snapshots
        .iter()
        .map(|s| MenuItem::item(s.name.clone()))
        .collect();
    let menu = Menu::new("Restore which snapshot?", items).with_footer(MENU_FOOTER);
    let Some(choice) = console.menu(&menu)? else {
        return Ok(());
    };

    let plan = restore_plan(&snapshots[choice])?;
    writeln!(console.writer(), "  {}", term::label("Snapshot contents:"))?;
    for (_, dest) in &plan {
        writeln!(console.writer(), "    {}", term::dim(&format!("→ {}", dest.display())))?;
    }
    match console.confirm("Restore these files?", false)? {
        Some(true) => {}
        _ => {
            writeln!(console.writer(), "  {}", term::dim("Cancelled."))?;
            return Ok(());
        }
    }
    restore(&plan)?;
    writeln!(
        console.writer(),
        "  {}",
        term::ok(&format!("✓ restored {} file(s)", plan.len()))
    )?;
    Ok(())
}

fn github_menu<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    loop {
        let menu = Menu::new(
            "GitHub",
            vec![
                MenuItem::item("Check login status"),
                MenuItem::item("Bind a repository to a project"),
                MenuItem::Separator,
                MenuItem::styled("Back", Style::Red),
            ],
        )
        .with_footer(MENU_FOOTER);
        match console.menu(&menu)? {
            None | Some(3) => return Ok(()),
            Some(0) => check_login(console)?,
            Some(1) => bind_repo(console)?,
            Some(_) => {}
        }
    }
}

fn check_login<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    writeln!(console.writer())?;
    match github::auth_status() {
        Ok(status) => {
            for line in status.lines() {
                writeln!(console.writer(), "  {line}")?;
            }
        }
        Err(gh_err) => writeln!(console.writer(), "  {}", term::err(&format!("✗ {gh_err}")))?,
    }
    writeln!(console.writer())?;
    console.wait_key("press any key to continue")?;
    Ok(())
}

fn bind_repo<K: KeyInput, R: BufRead, W: Write>(console: &mut Console<K, R, W>) -> Result<()> {
    // Candidate targets: the working-directory project first, then every
    // registered project.
    let cwd = env::current_dir()?;
    let mut targets: Vec<(String, std::path::PathBuf)> = Vec::new();
    if let Some(path) = find_config_in_dir(&cwd) {
        targets.push(("Current directory project".to_string(), path));
    }
    for project in scan_projects()? {
        targets.push((format!("[{}] {}", project.id, project.name), project.path));
    }
    if targets.is_empty() {
        writeln!(
            console.writer(),
            "  {}",
            term::warn("No projects to bind. Run `iss project` first.")
        )?;
        return Ok(());
    }

    let items: Vec<MenuItem> = targets
        .iter()
        .map(|(target_label, _)| MenuItem::item(target_label.clone()))
        .collect();
    let menu = Menu::new("Bind repository to which project?", items).with_footer(MENU_FOOTER);
    let Some(choice) = console.menu(&menu)? else {
        return Ok(());
    };
    let config_path = targets[choice].1.clone();

    let repos = match github::list_repos(30) {
        Ok(repos) => repos,
        Err(gh_err) => {
            writeln!(console.writer(), "  {}", term::err(&format!("✗ {gh_err}")))?;
            return Ok(());
        }
    };

    let repo = if repos.is_empty() {
        match console.text_line("Repository (owner/name)", None)? {
            Some(repo) => repo,
            None => return Ok(()),
        }
    } else {
        let mut items: Vec<MenuItem> = repos.iter().map(|r| MenuItem::item(r.clone())).collect();
        let manual_index = items.len() + 1;
        items.push(MenuItem::Separator);
        items.push(MenuItem::styled("Enter manually", Style::Yellow));
        let menu = Menu::new("Bind which repository?", items).with_footer(MENU_FOOTER);
        match console.menu(&menu)? {
            None => return Ok(()),
            Some(idx) if idx == manual_index => {
                match console.text_line("Repository (owner/name)", None)? {
                    Some(repo) => repo,
                    None => return Ok(()),
                }
            }
            Some(idx) => repos[idx].clone(),
        }
    };

    bind_repo_to_config(&config_path, &repo)?;
    writeln!(
        console.writer(),
        "  {}",
        term::ok(&format!("✓ bound {repo} → {}", config_path.display()))
    )?;
    Ok(())
}

/// Load, bind, save. Separated from the menu flow for tests.
pub fn bind_repo_to_config(config_path: &Path, repo: &str) -> Result<()> {
    let mut file = ProjectFile::load(config_path)?;
    file.github.repo = Some(repo.to_string());
    file.save(config_path)?;
    debug!(repo, config = %config_path.display(), "repository bound");
    Ok(())
}

fn edit_current_project<K: KeyInput, R: BufRead, W: Write>(
    console: &mut Console<K, R, W>,
    path: &Path,
) -> Result<()> {
    let record = match ProjectFile::load(path) {
        Ok(record) => record,
        Err(load_err) => {
            writeln!(console.writer(), "  {}", term::err(&format!("✗ {load_err:#}")))?;
            return Ok(());
        }
    };
    let path_owned = path.to_path_buf();
    let mut persist = |edited: &ProjectFile| project::persist_project(&path_owned, edited);
    project::edit_project(console, &record, &mut persist)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::test_utils::ScriptedKeys;
    use crate::term::Key;
    use std::io::Cursor;

    type TestConsole = Console<ScriptedKeys, Cursor<Vec<u8>>, Vec<u8>>;

    fn console(keys: &[Key], lines: &str) -> TestConsole {
        Console::new(
            ScriptedKeys::new(keys),
            Cursor::new(lines.as_bytes().to_vec()),
            Vec::new(),
        )
    }

    #[test]
    fn globals_session_submit_saves_once() {
        let mut saved: Vec<GlobalDefaults> = Vec::new();
        let mut persist = |d: &GlobalDefaults| {
            saved.push(d.clone());
            Ok(())
        };
        // Edit priorities, then move up to Submit (Up wraps to Cancel,
        // Up again is Submit).
        let keys = vec![Key::Enter, Key::Up, Key::Up, Key::Enter];
        let mut console = console(&keys, "high,low\n");
        let outcome =
            edit_globals_session(&mut console, &GlobalDefaults::builtin(), &mut persist).unwrap();
        assert_eq!(outcome, SessionOutcome::Saved);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].priorities, vec!["high", "low"]);
        assert_eq!(saved[0].statuses, GlobalDefaults::builtin().statuses);
    }

    #[test]
    fn globals_session_esc_discards_without_saving() {
        let mut calls = 0;
        let mut persist = |_: &GlobalDefaults| {
            calls += 1;
            Ok(())
        };
        let mut console = console(&[Key::Esc], "");
        let outcome =
            edit_globals_session(&mut console, &GlobalDefaults::builtin(), &mut persist).unwrap();
        assert_eq!(outcome, SessionOutcome::Discarded);
        assert_eq!(calls, 0);
    }

    #[test]
    fn bind_repo_updates_only_the_repo_field() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("issue-tracker.yaml");
        let file = ProjectFile::seeded("001".into(), "Demo".into(), &GlobalDefaults::builtin());
        file.save(&path).unwrap();

        bind_repo_to_config(&path, "octo/demo").unwrap();
        let loaded = ProjectFile::load(&path).unwrap();
        assert_eq!(loaded.github.repo.as_deref(), Some("octo/demo"));
        assert_eq!(loaded.priorities, file.priorities);
    }
}
