//! The interactive widget set: arrow-key menu, yes/no confirm, wait-for-key,
//! and decorated line input.
//!
//! Every widget blocks on one key at a time, redraws itself in place, and
//! resolves with either a value or `None` for Esc. Ctrl-C is never handled
//! here beyond erasing the widget: it unwinds as [`UiError::Interrupted`].
//! Widgets are generic over the key source, line reader, and writer so the
//! whole layer runs against scripted input in tests.

use std::io::{self, BufRead, Write};

use super::erase::{clear_current_line, erase_previous};
use super::input::TtyKeys;
use super::key::{Key, KeyInput};
use super::render::{term_width, title_bar};
use super::style::{dim, label, paint, value, Style};
use super::UiError;

/// One menu row. Separators render as rules and can never be selected;
/// styled entries carry their own idle color (used for Submit/Cancel pairs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Item(String),
    Styled(String, Style),
    Separator,
}

impl MenuItem {
    pub fn item(text: impl Into<String>) -> Self {
        MenuItem::Item(text.into())
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        MenuItem::Styled(text.into(), style)
    }

    fn is_selectable(&self) -> bool {
        !matches!(self, MenuItem::Separator)
    }

    fn text(&self) -> Option<&str> {
        match self {
            MenuItem::Item(text) | MenuItem::Styled(text, _) => Some(text),
            MenuItem::Separator => None,
        }
    }
}

/// A menu specification: immutable during a run, rebuilt per invocation.
#[derive(Debug, Clone)]
pub struct Menu {
    title: String,
    items: Vec<MenuItem>,
    footer: Option<String>,
    header: Vec<String>,
}

impl Menu {
    pub fn new(title: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Menu {
            title: title.into(),
            items,
            footer: None,
            header: Vec::new(),
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Decorative lines drawn above the title bar; they take part in the
    /// redraw line count.
    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = header;
        self
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    fn first_selectable(&self) -> Option<usize> {
        self.items.iter().position(MenuItem::is_selectable)
    }

    /// Next selectable index in `direction`, wrapping at both boundaries.
    fn step(&self, from: usize, direction: isize) -> usize {
        let n = self.items.len() as isize;
        let mut idx = from as isize;
        for _ in 0..n {
            idx = (idx + direction).rem_euclid(n);
            if self.items[idx as usize].is_selectable() {
                return idx as usize;
            }
        }
        from
    }
}

/// Bundles the three streams a widget touches. Production code uses
/// [`Console::stdio`]; tests plug in scripted keys and byte buffers.
#[derive(Debug)]
pub struct Console<K, R, W> {
    keys: K,
    lines: R,
    out: W,
}

/// The console wired to the real terminal.
pub type StdConsole = Console<TtyKeys, io::BufReader<io::Stdin>, io::Stdout>;

impl StdConsole {
    pub fn stdio() -> Self {
        Console {
            keys: TtyKeys::new(),
            lines: io::BufReader::new(io::stdin()),
            out: io::stdout(),
        }
    }
}

impl<K: KeyInput, R: BufRead, W: Write> Console<K, R, W> {
    pub fn new(keys: K, lines: R, out: W) -> Self {
        Console { keys, lines, out }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    /// Run an arrow-key menu to completion.
    ///
    /// Returns the selected item index (counted over all items, separators
    /// included), or `None` when the user backs out with Esc. A menu with
    /// no selectable entry is a caller bug and fails immediately.
    pub fn menu(&mut self, menu: &Menu) -> Result<Option<usize>, UiError> {
        let mut cursor = menu.first_selectable().ok_or(UiError::NoSelectable)?;
        let width = term_width();
        let mut drawn = draw_menu(&mut self.out, menu, cursor, width)?;
        loop {
            let key = match self.keys.read_key() {
                Ok(key) => key,
                Err(unwind) => {
                    erase_previous(&mut self.out, drawn)?;
                    return Err(unwind);
                }
            };
            match key {
                Key::Enter => {
                    erase_previous(&mut self.out, drawn)?;
                    return Ok(Some(cursor));
                }
                Key::Esc => {
                    erase_previous(&mut self.out, drawn)?;
                    return Ok(None);
                }
                Key::Down | Key::Tab => cursor = menu.step(cursor, 1),
                Key::Up | Key::BackTab => cursor = menu.step(cursor, -1),
                _ => continue,
            }
            erase_previous(&mut self.out, drawn)?;
            drawn = draw_menu(&mut self.out, menu, cursor, width)?;
        }
    }

    /// Left/right boolean toggle on a single line.
    ///
    /// Enter returns the current choice, Esc returns `None`; whether that
    /// means "keep the default" is the caller's decision.
    pub fn confirm(&mut self, prompt: &str, default: bool) -> Result<Option<bool>, UiError> {
        let mut yes = default;
        draw_confirm(&mut self.out, prompt, yes)?;
        loop {
            let key = match self.keys.read_key() {
                Ok(key) => key,
                Err(unwind) => {
                    erase_previous(&mut self.out, 1)?;
                    return Err(unwind);
                }
            };
            match key {
                Key::Enter => {
                    erase_previous(&mut self.out, 1)?;
                    return Ok(Some(yes));
                }
                Key::Esc => {
                    erase_previous(&mut self.out, 1)?;
                    return Ok(None);
                }
                Key::Left => yes = true,
                Key::Right => yes = false,
                _ => continue,
            }
            erase_previous(&mut self.out, 1)?;
            draw_confirm(&mut self.out, prompt, yes)?;
        }
    }

    /// Dim prompt, block for any key, clear the prompt line.
    pub fn wait_key(&mut self, msg: &str) -> Result<(), UiError> {
        write!(self.out, "  {}", dim(msg))?;
        self.out.flush()?;
        let result = self.keys.read_key();
        clear_current_line(&mut self.out)?;
        result.map(|_| ())
    }

    /// Decorated prompt over the host's buffered line input, so native
    /// editing and IME composition keep working.
    ///
    /// Empty input resolves to the default when one was supplied and to
    /// `None` otherwise, an explicit "no value" distinct from `Some("")`.
    pub fn text_line(
        &mut self,
        prompt: &str,
        default: Option<&str>,
    ) -> Result<Option<String>, UiError> {
        match default {
            Some(def) => write!(
                self.out,
                "  {} [{}]: ",
                label(prompt),
                value(def)
            )?,
            None => write!(self.out, "  {}: ", label(prompt))?,
        }
        self.out.flush()?;

        let mut raw = String::new();
        if self.lines.read_line(&mut raw)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(default.map(str::to_string));
        }
        Ok(Some(trimmed.to_string()))
    }
}

fn draw_menu<W: Write>(
    out: &mut W,
    menu: &Menu,
    cursor: usize,
    width: usize,
) -> Result<usize, UiError> {
    let mut lines = 0;
    for decoration in &menu.header {
        writeln!(out, "{decoration}")?;
        lines += 1;
    }
    writeln!(out, "{}", title_bar(&menu.title, width))?;
    lines += 1;
    for (idx, item) in menu.items.iter().enumerate() {
        match item {
            MenuItem::Separator => {
                writeln!(out, "  {}", dim(&"─".repeat(width.saturating_sub(4))))?;
            }
            _ if idx == cursor => {
                let text = item.text().unwrap_or_default();
                writeln!(
                    out,
                    "  {}{}",
                    paint("▸ ", &[Style::Green, Style::Bold]),
                    paint(text, &[Style::White, Style::Bold]),
                )?;
            }
            MenuItem::Item(text) => {
                writeln!(out, "    {}", paint(text, &[Style::Gray]))?;
            }
            MenuItem::Styled(text, style) => {
                writeln!(out, "    {}", paint(text, &[*style]))?;
            }
        }
        lines += 1;
    }
    if let Some(footer) = &menu.footer {
        writeln!(out, "  {}", dim(footer))?;
        lines += 1;
    }
    out.flush()?;
    Ok(lines)
}

fn draw_confirm<W: Write>(out: &mut W, prompt: &str, yes: bool) -> io::Result<()> {
    let (yes_part, no_part) = if yes {
        (
            paint("● Yes", &[Style::Green, Style::Bold]),
            paint("○ No", &[Style::Red]),
        )
    } else {
        (
            paint("○ Yes", &[Style::Green]),
            paint("● No", &[Style::Red, Style::Bold]),
        )
    };
    writeln!(out, "  {}   {}    {}", label(prompt), yes_part, no_part)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::test_utils::ScriptedKeys;
    use std::io::Cursor;

    fn make_console(keys: ScriptedKeys) -> Console<ScriptedKeys, Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(keys, Cursor::new(Vec::new()), Vec::new())
    }

    fn console_with_lines(
        keys: ScriptedKeys,
        input: &str,
    ) -> Console<ScriptedKeys, Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(keys, Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn pick_menu() -> Menu {
        Menu::new(
            "Pick",
            vec![
                MenuItem::item("A"),
                MenuItem::item("B"),
                MenuItem::Separator,
                MenuItem::styled("Submit", Style::Green),
                MenuItem::styled("Cancel", Style::Red),
            ],
        )
    }

    fn erase_count(output: &[u8]) -> usize {
        let text = String::from_utf8_lossy(output);
        text.matches("\x1b[A\x1b[2K").count()
    }

    #[test]
    fn menu_skips_separator_going_down() {
        let mut console = make_console(ScriptedKeys::new(&[
            Key::Down,
            Key::Down,
            Key::Down,
            Key::Enter,
        ]));
        let picked = console.menu(&pick_menu()).unwrap();
        // 0 -> 1 -> 3 -> 4; the separator at 2 is never the selection.
        assert_eq!(picked, Some(4));
    }

    #[test]
    fn menu_skips_separator_going_up() {
        let mut console = make_console(ScriptedKeys::new(&[Key::Up, Key::Up, Key::Up, Key::Enter]));
        // 0 wraps to 4, then 3, then past the separator to 1.
        let picked = console.menu(&pick_menu()).unwrap();
        assert_eq!(picked, Some(1));
    }

    #[test]
    fn menu_down_n_times_returns_to_first_selectable() {
        let menu = Menu::new(
            "Cycle",
            vec![
                MenuItem::item("a"),
                MenuItem::Separator,
                MenuItem::item("b"),
                MenuItem::item("c"),
            ],
        );
        // Three selectable entries: three Downs from the first must land
        // back on it.
        let mut console = make_console(ScriptedKeys::new(&[
            Key::Down,
            Key::Down,
            Key::Down,
            Key::Enter,
        ]));
        assert_eq!(console.menu(&menu).unwrap(), Some(0));
    }

    #[test]
    fn menu_tab_and_back_tab_mirror_arrows() {
        let mut console = make_console(ScriptedKeys::new(&[Key::Tab, Key::Enter]));
        assert_eq!(console.menu(&pick_menu()).unwrap(), Some(1));

        let mut console = make_console(ScriptedKeys::new(&[Key::BackTab, Key::Enter]));
        assert_eq!(console.menu(&pick_menu()).unwrap(), Some(4));
    }

    #[test]
    fn menu_esc_as_first_key_returns_none() {
        let mut console = make_console(ScriptedKeys::new(&[Key::Esc]));
        assert_eq!(console.menu(&pick_menu()).unwrap(), None);
    }

    #[test]
    fn menu_with_no_selectable_entries_is_rejected() {
        let menu = Menu::new("Broken", vec![MenuItem::Separator, MenuItem::Separator]);
        let mut console = make_console(ScriptedKeys::new(&[Key::Enter]));
        assert!(matches!(console.menu(&menu), Err(UiError::NoSelectable)));
    }

    #[test]
    fn menu_ignores_unrelated_keys_without_redraw() {
        let mut console = make_console(ScriptedKeys::new(&[
            Key::Char('x'),
            Key::Backspace,
            Key::Enter,
        ]));
        assert_eq!(console.menu(&pick_menu()).unwrap(), Some(0));
        // One render (6 lines incl. title), erased once on Enter.
        assert_eq!(erase_count(&console.out), 6);
    }

    #[test]
    fn menu_erases_exactly_what_it_drew() {
        let menu = pick_menu()
            .with_header(vec!["deco one".into(), "deco two".into()])
            .with_footer("move with arrows");
        let mut console = make_console(ScriptedKeys::new(&[Key::Down, Key::Enter]));
        console.menu(&menu).unwrap();
        // 2 header + 1 title + 5 items + 1 footer = 9 lines per render,
        // two renders fully erased.
        assert_eq!(erase_count(&console.out), 18);
    }

    #[test]
    fn menu_interrupt_unwinds_after_erasing() {
        let mut console = make_console(ScriptedKeys::then_interrupt(&[Key::Down]));
        let result = console.menu(&pick_menu());
        assert!(matches!(result, Err(UiError::Interrupted)));
        // Both renders (initial + after Down) were cleaned up.
        assert_eq!(erase_count(&console.out), 12);
    }

    #[test]
    fn confirm_enter_returns_default_without_toggling() {
        let mut console = make_console(ScriptedKeys::new(&[Key::Enter]));
        assert_eq!(console.confirm("Proceed?", true).unwrap(), Some(true));

        let mut console = make_console(ScriptedKeys::new(&[Key::Enter]));
        assert_eq!(console.confirm("Proceed?", false).unwrap(), Some(false));
    }

    #[test]
    fn confirm_left_right_toggle() {
        let mut console = make_console(ScriptedKeys::new(&[Key::Right, Key::Enter]));
        assert_eq!(console.confirm("Proceed?", true).unwrap(), Some(false));

        let mut console = make_console(ScriptedKeys::new(&[Key::Right, Key::Left, Key::Enter]));
        assert_eq!(console.confirm("Proceed?", true).unwrap(), Some(true));
    }

    #[test]
    fn confirm_esc_returns_no_answer() {
        let mut console = make_console(ScriptedKeys::new(&[Key::Esc]));
        assert_eq!(console.confirm("Proceed?", true).unwrap(), None);
    }

    #[test]
    fn text_line_empty_input_returns_default() {
        let mut console = console_with_lines(ScriptedKeys::new(&[]), "\n");
        let got = console.text_line("Name", Some("fallback")).unwrap();
        assert_eq!(got, Some("fallback".to_string()));
    }

    #[test]
    fn text_line_empty_input_without_default_is_none() {
        let mut console = console_with_lines(ScriptedKeys::new(&[]), "\n");
        assert_eq!(console.text_line("Name", None).unwrap(), None);
    }

    #[test]
    fn text_line_trims_and_returns_input() {
        let mut console = console_with_lines(ScriptedKeys::new(&[]), "  hello world \n");
        let got = console.text_line("Name", Some("unused")).unwrap();
        assert_eq!(got, Some("hello world".to_string()));
    }

    #[test]
    fn text_line_eof_is_none_even_with_default() {
        let mut console = console_with_lines(ScriptedKeys::new(&[]), "");
        assert_eq!(console.text_line("Name", Some("d")).unwrap(), None);
    }

    #[test]
    fn wait_key_draws_and_clears_prompt() {
        let mut console = make_console(ScriptedKeys::new(&[Key::Char(' ')]));
        console.wait_key("press any key").unwrap();
        let text = String::from_utf8_lossy(&console.out);
        assert!(text.contains("press any key"));
        assert!(text.ends_with("\x1b[2K\r"));
    }
}
