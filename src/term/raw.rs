//! Scoped raw-mode ownership with guaranteed restore.
//!
//! The terminal's input mode is the one piece of shared mutable state in the
//! whole tool. Every blocking key read acquires this guard; nesting is
//! ref-counted so an inner widget returns the stream to the outer widget
//! exactly as it found it, and a shared panic hook restores cooked mode even
//! on unwind.

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

static RAW_DEPTH: AtomicUsize = AtomicUsize::new(0);
static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

/// RAII guard over raw input mode. Acquire before reading single keys,
/// drop to hand the previous mode back.
#[derive(Debug)]
pub struct RawModeGuard(());

impl RawModeGuard {
    pub fn acquire() -> io::Result<Self> {
        install_panic_hook();
        if RAW_DEPTH.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Err(err) = enable_raw_mode() {
                RAW_DEPTH.fetch_sub(1, Ordering::SeqCst);
                return Err(err);
            }
        }
        Ok(RawModeGuard(()))
    }

    /// Current nesting depth, exposed for tests.
    pub fn depth() -> usize {
        RAW_DEPTH.load(Ordering::SeqCst)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if RAW_DEPTH.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = disable_raw_mode();
        }
    }
}

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if RAW_DEPTH.load(Ordering::SeqCst) > 0 {
                let _ = disable_raw_mode();
            }
            previous(info);
        }));
    });
}
