//! Stateless line formatters for titled bars, rules, and key/value rows.
//!
//! All width math strips SGR sequences first and counts CJK characters as
//! two columns, so styled strings line up the same as plain ones.

use unicode_width::UnicodeWidthStr;

use super::style::{dim, label, paint, value, Style};

/// Fallback width when the terminal size is unknown (pipes, tests).
const FALLBACK_WIDTH: usize = 60;

/// Current terminal width in columns.
pub fn term_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => cols as usize,
        _ => FALLBACK_WIDTH,
    }
}

/// Display width of `text` with ANSI sequences removed.
pub fn visible_width(text: &str) -> usize {
    let stripped = strip_ansi_escapes::strip_str(text);
    stripped.width()
}

/// A full-width horizontal rule.
pub fn hr(width: usize) -> String {
    paint(&"─".repeat(width), &[Style::Cyan])
}

/// Menu title bar: `══ title ══════`.
pub fn title_bar(title: &str, width: usize) -> String {
    let title_text = format!(" {title} ");
    let title_w = visible_width(&title_text);
    let left = 2;
    let right = width.saturating_sub(left + title_w).max(1);
    format!(
        "{}{}{}",
        paint(&"═".repeat(left), &[Style::Cyan, Style::Bold]),
        paint(&title_text, &[Style::White, Style::Bold]),
        paint(&"═".repeat(right), &[Style::Cyan, Style::Bold]),
    )
}

/// Boxed section header: a title between two full-width double rules.
pub fn section_header(title: &str, width: usize) -> Vec<String> {
    let bar = paint(&"═".repeat(width), &[Style::Cyan, Style::Bold]);
    vec![
        bar.clone(),
        paint(&format!("  {title}"), &[Style::White, Style::Bold]),
        bar,
    ]
}

/// Single-line banner: `┄ text ┄┄┄┄┄` filled to `width`.
pub fn banner_line(text: &str, width: usize) -> String {
    let prefix = format!("┄ {text} ");
    let fill = width.saturating_sub(visible_width(&prefix)).max(1);
    paint(
        &format!("{prefix}{}", "┄".repeat(fill)),
        &[Style::Cyan, Style::Dim],
    )
}

/// Labeled value row: `  label: value` with the standard field colors.
pub fn kv(name: &str, val: &str) -> String {
    format!("  {} {}", label(&format!("{name}:")), value(val))
}
