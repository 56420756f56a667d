//! Modal wrapper around the query textarea. Keys are interpreted per mode:
//! navigation moves, insert types, visual selects. Anything unbound is a
//! silent no-op so stray keys never mutate the buffer.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders},
    Frame,
};
use tui_textarea::{CursorMove, TextArea};

use crate::mode::Mode;

/// What a keystroke did, for the browser to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorResponse {
    None,
    ModeChanged(Mode),
    TextChanged,
    Yanked(String),
}

pub struct QueryEditor {
    mode: Mode,
    textarea: TextArea<'static>,
}

impl Default for QueryEditor {
    fn default() -> Self {
        let mut textarea = TextArea::default();
        textarea.set_cursor_line_style(ratatui::style::Style::default());
        textarea.set_selection_style(tablescope_theme::selection_active());
        Self { mode: Mode::Navigation, textarea }
    }
}

impl QueryEditor {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn get_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.textarea.lines().iter().all(|l| l.trim().is_empty())
    }

    pub fn set_text(&mut self, text: &str) {
        self.textarea = TextArea::from(text.lines().map(String::from).collect::<Vec<_>>());
        self.textarea.set_cursor_line_style(ratatui::style::Style::default());
        self.textarea.set_selection_style(tablescope_theme::selection_active());
        self.textarea.move_cursor(CursorMove::End);
        self.mode = Mode::Navigation;
    }

    /// Replace the whole buffer, used by completion acceptance. Cursor lands
    /// at the end of the inserted text.
    pub fn replace_text(&mut self, text: &str) {
        let mode = self.mode;
        self.set_text(text);
        self.mode = mode;
    }

    fn enter(&mut self, mode: Mode) -> EditorResponse {
        if mode != Mode::Visual && self.mode == Mode::Visual {
            self.textarea.cancel_selection();
        }
        self.mode = mode;
        EditorResponse::ModeChanged(mode)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorResponse {
        match self.mode {
            Mode::Insert => self.handle_insert_key(key),
            Mode::Navigation => self.handle_navigation_key(key),
            Mode::Visual => self.handle_visual_key(key),
        }
    }

    fn handle_insert_key(&mut self, key: KeyEvent) -> EditorResponse {
        if key.code == KeyCode::Esc {
            return self.enter(Mode::Navigation);
        }
        if self.textarea.input(key) {
            EditorResponse::TextChanged
        } else {
            EditorResponse::None
        }
    }

    fn handle_navigation_key(&mut self, key: KeyEvent) -> EditorResponse {
        match key.code {
            KeyCode::Char('i') => self.enter(Mode::Insert),
            KeyCode::Char('a') => {
                self.textarea.move_cursor(CursorMove::Forward);
                self.enter(Mode::Insert)
            },
            KeyCode::Char('A') => {
                self.textarea.move_cursor(CursorMove::End);
                self.enter(Mode::Insert)
            },
            KeyCode::Char('I') => {
                self.textarea.move_cursor(CursorMove::Head);
                self.enter(Mode::Insert)
            },
            KeyCode::Char('o') => {
                self.textarea.move_cursor(CursorMove::End);
                self.textarea.insert_newline();
                self.enter(Mode::Insert)
            },
            KeyCode::Char('v') => {
                self.textarea.start_selection();
                self.enter(Mode::Visual)
            },
            KeyCode::Char('h') | KeyCode::Left => {
                self.textarea.move_cursor(CursorMove::Back);
                EditorResponse::None
            },
            KeyCode::Char('l') | KeyCode::Right => {
                self.textarea.move_cursor(CursorMove::Forward);
                EditorResponse::None
            },
            KeyCode::Char('j') | KeyCode::Down => {
                self.textarea.move_cursor(CursorMove::Down);
                EditorResponse::None
            },
            KeyCode::Char('k') | KeyCode::Up => {
                self.textarea.move_cursor(CursorMove::Up);
                EditorResponse::None
            },
            KeyCode::Char('w') => {
                self.textarea.move_cursor(CursorMove::WordForward);
                EditorResponse::None
            },
            KeyCode::Char('b') => {
                self.textarea.move_cursor(CursorMove::WordBack);
                EditorResponse::None
            },
            KeyCode::Char('0') => {
                self.textarea.move_cursor(CursorMove::Head);
                EditorResponse::None
            },
            KeyCode::Char('$') => {
                self.textarea.move_cursor(CursorMove::End);
                EditorResponse::None
            },
            KeyCode::Char('x') => {
                if self.textarea.delete_next_char() {
                    EditorResponse::TextChanged
                } else {
                    EditorResponse::None
                }
            },
            _ => EditorResponse::None,
        }
    }

    fn handle_visual_key(&mut self, key: KeyEvent) -> EditorResponse {
        match key.code {
            KeyCode::Esc => self.enter(Mode::Navigation),
            KeyCode::Char('y') => {
                self.textarea.copy();
                let yanked = self.textarea.yank_text();
                self.enter(Mode::Navigation);
                EditorResponse::Yanked(yanked)
            },
            KeyCode::Char('d') | KeyCode::Char('x') => {
                self.textarea.cut();
                self.enter(Mode::Navigation);
                EditorResponse::TextChanged
            },
            KeyCode::Char('h') | KeyCode::Left => {
                self.textarea.move_cursor(CursorMove::Back);
                EditorResponse::None
            },
            KeyCode::Char('l') | KeyCode::Right => {
                self.textarea.move_cursor(CursorMove::Forward);
                EditorResponse::None
            },
            KeyCode::Char('j') | KeyCode::Down => {
                self.textarea.move_cursor(CursorMove::Down);
                EditorResponse::None
            },
            KeyCode::Char('k') | KeyCode::Up => {
                self.textarea.move_cursor(CursorMove::Up);
                EditorResponse::None
            },
            KeyCode::Char('w') => {
                self.textarea.move_cursor(CursorMove::WordForward);
                EditorResponse::None
            },
            KeyCode::Char('b') => {
                self.textarea.move_cursor(CursorMove::WordBack);
                EditorResponse::None
            },
            KeyCode::Char('0') => {
                self.textarea.move_cursor(CursorMove::Head);
                EditorResponse::None
            },
            KeyCode::Char('$') => {
                self.textarea.move_cursor(CursorMove::End);
                EditorResponse::None
            },
            _ => EditorResponse::None,
        }
    }

    pub fn draw(&mut self, f: &mut Frame<'_>, area: Rect, focused: bool) {
        let border = if focused { tablescope_theme::border_focused() } else { tablescope_theme::border_normal() };
        let cursor = match self.mode {
            Mode::Navigation => tablescope_theme::cursor_normal(),
            Mode::Insert => tablescope_theme::cursor_insert(),
            Mode::Visual => tablescope_theme::cursor_visual(),
        };
        self.textarea.set_cursor_style(cursor);
        self.textarea.set_block(
            Block::default().borders(Borders::ALL).border_style(border).title(format!(" query [{}] ", self.mode)),
        );
        f.render_widget(&self.textarea, area);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;

    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn esc() -> KeyEvent {
        KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)
    }

    #[test]
    fn i_enters_insert_and_esc_leaves_it() {
        let mut editor = QueryEditor::default();
        assert_eq!(editor.handle_key(key('i')), EditorResponse::ModeChanged(Mode::Insert));
        assert_eq!(editor.mode(), Mode::Insert);
        assert_eq!(editor.handle_key(esc()), EditorResponse::ModeChanged(Mode::Navigation));
    }

    #[test]
    fn insert_mode_types_navigation_mode_does_not() {
        let mut editor = QueryEditor::default();
        editor.handle_key(key('i'));
        assert_eq!(editor.handle_key(key('s')), EditorResponse::TextChanged);
        editor.handle_key(esc());
        // 'e' is unbound in navigation; the buffer must not change.
        editor.handle_key(key('e'));
        assert_eq!(editor.get_text(), "s");
    }

    #[test]
    fn visual_yank_returns_selection_and_exits_visual() {
        let mut editor = QueryEditor::default();
        editor.set_text("select");
        editor.handle_key(key('0'));
        editor.handle_key(key('v'));
        editor.handle_key(key('$'));
        match editor.handle_key(key('y')) {
            EditorResponse::Yanked(text) => assert_eq!(text, "select"),
            other => panic!("expected yank, got {other:?}"),
        }
        assert_eq!(editor.mode(), Mode::Navigation);
    }

    #[test]
    fn set_text_resets_to_navigation() {
        let mut editor = QueryEditor::default();
        editor.handle_key(key('i'));
        editor.set_text("SELECT 1");
        assert_eq!(editor.mode(), Mode::Navigation);
        assert_eq!(editor.get_text(), "SELECT 1");
    }
}
