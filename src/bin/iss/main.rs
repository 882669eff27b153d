//! `iss` entry point.

mod cli;
mod commands;

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use issue_tracker::config::paths::{ensure_directories, find_config_in_dir, CONFIG_FILENAME};
use issue_tracker::config::{GlobalConfig, ProjectFile};
use issue_tracker::telemetry;
use issue_tracker::term::{StdConsole, UiError};
use issue_tracker::ui;

use crate::cli::{Cli, Command};
use crate::commands::{find_project_config, open_database};

fn main() -> ExitCode {
    let args = Cli::parse();
    telemetry::init_logging(args.logs);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if is_interrupt(&error) {
                eprintln!("Cancelled.");
                // Conventional exit status for SIGINT-style cancellation.
                return ExitCode::from(130);
            }
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn is_interrupt(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<UiError>(), Some(UiError::Interrupted)))
}

fn run(args: Cli) -> Result<()> {
    match &args.command {
        Command::Ui => {
            ensure_directories()?;
            let mut console = StdConsole::stdio();
            ui::main_menu(&mut console)
        }
        Command::Project => run_project(),
        command => {
            let config_path = find_project_config(args.config.as_deref())?;
            let config = ProjectFile::load(&config_path)?;
            let db = open_database(&config)?;
            match command {
                Command::Add(add) => commands::cmd_add(add, &config, &db),
                Command::Update(update) => commands::cmd_update(update, &config, &db),
                Command::Query(query) => commands::cmd_query(query, &db),
                Command::List(list) => commands::cmd_list(list, &db),
                Command::Stats => commands::cmd_stats(&config, &db),
                Command::Export(export) => commands::cmd_export(export, &config, &db),
                Command::Sync(sync) => commands::cmd_sync(sync, &config, &db),
                Command::Ui | Command::Project => unreachable!("handled above"),
            }
        }
    }
}

/// `iss project`: edit the existing config here, or create one.
fn run_project() -> Result<()> {
    ensure_directories()?;
    let cwd = env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILENAME);
    let mut console = StdConsole::stdio();

    if find_config_in_dir(&cwd).is_some() {
        let record = ProjectFile::load(&config_path)?;
        let mut persist = |edited: &ProjectFile| ui::project::persist_project(&config_path, edited);
        ui::project::edit_project(&mut console, &record, &mut persist)?;
    } else {
        let defaults = GlobalConfig::load()?.defaults();
        let mut persist = |created: &ProjectFile| ui::project::persist_project(&config_path, created);
        ui::project::guided_create(&mut console, &defaults, &config_path, &mut persist)?;
    }
    Ok(())
}
