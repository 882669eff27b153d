//! Terminal interaction core.
//!
//! Raw-mode key reading, ANSI styling, in-place menu redraw, and the small
//! widget set (`menu`, `confirm`, `wait_key`, `text_line`) the interactive
//! flows are built from. No alternate screen and no screen buffer: widgets
//! draw with plain writes and erase exactly the lines they drew.

mod erase;
mod input;
mod key;
mod raw;
mod render;
mod style;
pub mod test_utils;
mod widgets;

pub use erase::{clear_current_line, erase_previous};
pub use input::TtyKeys;
pub use key::{read_key, ByteSource, Key, KeyInput, ESC_POLL_TIMEOUT};
pub use raw::RawModeGuard;
pub use render::{banner_line, hr, kv, section_header, term_width, title_bar, visible_width};
pub use style::{colors_enabled, dim, err, label, ok, paint, paint_with, value, warn, Style};
pub use widgets::{Console, Menu, MenuItem, StdConsole};

use std::fmt;
use std::io;

/// Error surface of the widget layer.
///
/// Cancellation (Esc) is not represented here: widgets report it as
/// `Ok(None)`. `Interrupted` is the Ctrl-C unwind signal and must pass
/// through every nested widget loop untouched.
#[derive(Debug)]
pub enum UiError {
    /// Ctrl-C while a widget was waiting for a key.
    Interrupted,
    /// Menu constructed without a single selectable entry.
    NoSelectable,
    Io(io::Error),
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiError::Interrupted => write!(f, "interrupted"),
            UiError::NoSelectable => write!(f, "menu has no selectable entries"),
            UiError::Io(err) => write!(f, "terminal i/o failed: {err}"),
        }
    }
}

impl std::error::Error for UiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UiError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for UiError {
    fn from(err: io::Error) -> Self {
        UiError::Io(err)
    }
}

impl UiError {
    /// True when the error is the Ctrl-C unwind signal.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, UiError::Interrupted)
    }
}
