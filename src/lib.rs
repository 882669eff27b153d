//! Issue tracker with an interactive terminal front end.
//!
//! The `term` module is the interaction core: a raw-mode key decoder,
//! ANSI styling that degrades off-terminal, and in-place redrawn widgets.
//! `session` layers the working-copy submit/cancel protocol on top, and the
//! remaining modules are the collaborators the interactive flows call into:
//! YAML configuration, SQLite storage, Markdown export, `gh`-based GitHub
//! sync, and project snapshots.

pub mod backup;
pub mod config;
pub mod export;
pub mod github;
pub mod model;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod term;
pub mod ui;
