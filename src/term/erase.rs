//! In-place redraw support: erase exactly the lines a widget last drew.
//!
//! There is no screen buffer. The calling widget owns the line count of its
//! previous render, including blank, separator, and footer lines, and must
//! pass it back verbatim: a wrong count either leaves residue or eats
//! unrelated output above the widget.

use std::io::{self, Write};

/// Cursor up one line, then erase that whole line.
const UP_AND_ERASE: &[u8] = b"\x1b[A\x1b[2K";

/// Erase the current line and return the cursor to column one.
const ERASE_LINE: &[u8] = b"\x1b[2K\r";

/// Move up over the previous `lines` lines, clearing each one.
pub fn erase_previous(out: &mut impl Write, lines: usize) -> io::Result<()> {
    for _ in 0..lines {
        out.write_all(UP_AND_ERASE)?;
    }
    out.flush()
}

/// Clear the line the cursor is on (used after single-line prompts).
pub fn clear_current_line(out: &mut impl Write) -> io::Result<()> {
    out.write_all(ERASE_LINE)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_previous_emits_one_sequence_per_line() {
        let mut out = Vec::new();
        erase_previous(&mut out, 3).unwrap();
        assert_eq!(out, b"\x1b[A\x1b[2K\x1b[A\x1b[2K\x1b[A\x1b[2K");
    }

    #[test]
    fn erase_previous_zero_lines_writes_nothing() {
        let mut out = Vec::new();
        erase_previous(&mut out, 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn clear_current_line_returns_cursor_to_column_one() {
        let mut out = Vec::new();
        clear_current_line(&mut out).unwrap();
        assert_eq!(out, b"\x1b[2K\r");
    }
}
