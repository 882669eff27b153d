//! ANSI styling that degrades to plain text.
//!
//! Escape sequences only ever reach an interactive terminal: piped or
//! redirected output gets the input string back byte-for-byte. The tty
//! check happens once per process.

use std::env;
use std::io::{stdout, IsTerminal};
use std::sync::OnceLock;

const RESET: &str = "\x1b[0m";

/// Composable visual attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Cyan,
    White,
    Gray,
}

impl Style {
    pub fn code(self) -> &'static str {
        match self {
            Style::Bold => "\x1b[1m",
            Style::Dim => "\x1b[2m",
            Style::Red => "\x1b[91m",
            Style::Green => "\x1b[92m",
            Style::Yellow => "\x1b[93m",
            Style::Cyan => "\x1b[96m",
            Style::White => "\x1b[97m",
            Style::Gray => "\x1b[90m",
        }
    }
}

/// Whether styled output is appropriate: stdout is a terminal and NO_COLOR
/// is unset. Cached for the life of the process.
pub fn colors_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| stdout().is_terminal() && env::var_os("NO_COLOR").is_none())
}

/// Wrap `text` in the given attributes, or return it unchanged when styling
/// is disabled.
pub fn paint(text: &str, styles: &[Style]) -> String {
    paint_with(colors_enabled(), text, styles)
}

/// The pure half of [`paint`]: the caller decides whether styling applies.
pub fn paint_with(enabled: bool, text: &str, styles: &[Style]) -> String {
    if !enabled || styles.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + styles.len() * 5 + RESET.len());
    for style in styles {
        out.push_str(style.code());
    }
    out.push_str(text);
    out.push_str(RESET);
    out
}

/// Success (green bold).
pub fn ok(text: &str) -> String {
    paint(text, &[Style::Green, Style::Bold])
}

/// Warning (yellow).
pub fn warn(text: &str) -> String {
    paint(text, &[Style::Yellow])
}

/// Error (red bold).
pub fn err(text: &str) -> String {
    paint(text, &[Style::Red, Style::Bold])
}

/// Secondary text (dim gray).
pub fn dim(text: &str) -> String {
    paint(text, &[Style::Dim, Style::Gray])
}

/// Field label (cyan bold).
pub fn label(text: &str) -> String {
    paint(text, &[Style::Cyan, Style::Bold])
}

/// Field value (white bold).
pub fn value(text: &str) -> String {
    paint(text, &[Style::White, Style::Bold])
}
