//! File-based tracing, opt-in via flag or environment.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

pub fn log_file_path() -> PathBuf {
    env::var("ISS_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("iss_trace.jsonl"))
}

/// Install the global JSON file subscriber once. Logging stays off unless
/// `enabled` (the `--logs` flag) or `ISS_LOGS` says otherwise; the
/// interactive stdout is never written to.
pub fn init_logging(enabled: bool) {
    let enabled = enabled || env::var_os("ISS_LOGS").is_some();
    if !enabled {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let path = log_file_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
