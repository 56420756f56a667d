//! Key dispatch for the browser. Priority order: help overlay, completion
//! popup, search box, modal editor, then per-focus navigation keys. Any key
//! with no binding in the active context is silently ignored.

use clipboard::ClipboardProvider;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;

use super::{Browser, Focus, Tab};
use crate::{
    action::Action,
    autocomplete::AutocompleteProvider,
    components::editor::EditorResponse,
    mode::Mode,
    render::DisplayMode,
    search::{self, parse_term},
    sidebar::SidebarRequest,
};

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

impl Browser {
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return Ok(None);
        }
        if self.autocomplete.is_active {
            if let Some(outcome) = self.handle_autocomplete_key(key) {
                return Ok(outcome);
            }
        }
        if self.focus == Focus::SearchBox {
            return self.handle_search_key(key);
        }
        if self.mode != Mode::Navigation {
            return self.handle_modal_editor_key(key);
        }
        self.handle_navigation_key(key)
    }

    /// Popup keys. Returns `None` when the key is not a popup key, letting it
    /// fall through to the editor so typing keeps refining suggestions.
    fn handle_autocomplete_key(&mut self, key: KeyEvent) -> Option<Option<Action>> {
        match key.code {
            KeyCode::Esc => {
                self.autocomplete.deactivate();
                Some(None)
            },
            KeyCode::Down => {
                self.autocomplete.select_next();
                Some(None)
            },
            KeyCode::Up => {
                self.autocomplete.select_previous();
                Some(None)
            },
            _ if is_ctrl(&key, 'n') => {
                self.autocomplete.select_next();
                Some(None)
            },
            _ if is_ctrl(&key, 'p') => {
                self.autocomplete.select_previous();
                Some(None)
            },
            KeyCode::Tab | KeyCode::Enter => {
                if let Some(item) = self.autocomplete.get_selected() {
                    let accepted = AutocompleteProvider::accept(&self.editor.get_text(), item);
                    self.editor.replace_text(&accepted);
                }
                self.autocomplete.deactivate();
                Some(None)
            },
            _ => None,
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Esc => {
                self.search.reset();
                self.metadata_filtered = None;
                self.focus = self.prev_focus;
                self.mode = Mode::Navigation;
                return Ok(Some(Action::ModeChanged(Mode::Navigation)));
            },
            KeyCode::Enter => {
                // Filter stays applied; focus returns to the results.
                self.focus = Focus::ResultsPane;
                self.mode = Mode::Navigation;
                return Ok(Some(Action::ModeChanged(Mode::Navigation)));
            },
            KeyCode::Backspace => {
                self.search.term.pop();
                self.search_debounce.trigger();
            },
            KeyCode::Char(c) => {
                self.search.term.push(c);
                self.search_debounce.trigger();
            },
            _ => {},
        }
        Ok(None)
    }

    fn handle_modal_editor_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if is_ctrl(&key, 'e') {
            return Ok(Some(Action::ExecuteQuery));
        }
        if is_ctrl(&key, ' ') || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('@')) {
            self.recompute_suggestions();
            return Ok(None);
        }
        match self.editor.handle_key(key) {
            EditorResponse::TextChanged => {
                if self.autocomplete.is_active {
                    self.autocomplete_debounce.trigger();
                }
            },
            EditorResponse::Yanked(text) => self.copy_to_clipboard(text, "selection"),
            EditorResponse::ModeChanged(_) | EditorResponse::None => {},
        }
        let mode = self.editor.mode();
        if mode != self.mode {
            self.mode = mode;
            // Leaving the editor modes with Esc hands focus back to the
            // sidebar; entering them always focuses the editor.
            if mode == Mode::Navigation && key.code == KeyCode::Esc {
                self.focus = Focus::Sidebar;
            } else if mode != Mode::Navigation {
                self.focus = Focus::QueryEditor;
            }
            return Ok(Some(Action::ModeChanged(mode)));
        }
        Ok(None)
    }

    fn handle_navigation_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if is_ctrl(&key, 'e') {
            return Ok(Some(Action::ExecuteQuery));
        }
        match key.code {
            KeyCode::Char('1') => {
                self.focus = Focus::Sidebar;
                return Ok(None);
            },
            KeyCode::Char('2') => {
                self.switch_tab(Tab::Query);
                return Ok(None);
            },
            KeyCode::Char('3') => {
                self.focus = Focus::ResultsPane;
                return Ok(None);
            },
            KeyCode::Char('4') => {
                self.switch_tab(Tab::History);
                return Ok(None);
            },
            KeyCode::Char('5') => {
                self.switch_tab(Tab::Favorites);
                return Ok(None);
            },
            KeyCode::Char('?') => {
                self.show_help = true;
                return Ok(None);
            },
            KeyCode::Char('i') if self.active_tab == Tab::Query && self.focus != Focus::QueryEditor => {
                self.focus = Focus::QueryEditor;
                return self.handle_modal_editor_key(key);
            },
            KeyCode::Esc => {
                // Overlay-first: popups were handled above, so Esc here
                // clears an applied filter, then leaves the editor, then
                // clears transient messages.
                if self.search.active || !self.search.term.is_empty() {
                    self.search.reset();
                    self.metadata_filtered = None;
                } else if self.focus == Focus::QueryEditor {
                    self.focus = Focus::Sidebar;
                } else if self.error_message.is_some() || self.status_message.is_some() {
                    self.error_message = None;
                    self.status_message = None;
                }
                return Ok(None);
            },
            _ => {},
        }
        match self.focus {
            Focus::Sidebar => self.handle_sidebar_key(key),
            Focus::QueryEditor => self.handle_editor_focus_key(key),
            Focus::ResultsPane => self.handle_results_key(key),
            Focus::HistoryList => self.handle_history_key(key),
            Focus::FavoritesList => self.handle_favorites_key(key),
            Focus::SearchBox => Ok(None),
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        self.focus = tab.default_focus();
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.sidebar.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.sidebar.select_previous(),
            KeyCode::Char('g') => self.sidebar.select_first(),
            KeyCode::Char('G') => self.sidebar.select_last(),
            KeyCode::Char('r') => return Ok(Some(Action::LoadNamespaces)),
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Char(' ') => {
                match self.sidebar.activate_selected() {
                    Some(SidebarRequest::FetchTables(namespace)) => {
                        return Ok(Some(Action::LoadTables(namespace)));
                    },
                    Some(SidebarRequest::SelectTable { namespace, table }) => {
                        self.insert_table_reference(&namespace, &table);
                        self.pending_table = Some((namespace.clone(), table.clone()));
                        return Ok(Some(Action::LoadTableMetadata(namespace, table)));
                    },
                    None => {},
                }
            },
            _ => {},
        }
        Ok(None)
    }

    fn handle_editor_focus_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Enter => return Ok(Some(Action::ExecuteQuery)),
            KeyCode::Char('f') => {
                let text = self.editor.get_text();
                if !text.trim().is_empty() {
                    let added = self.favorites.toggle(&text);
                    self.set_status(if added { "added to favorites" } else { "removed from favorites" });
                }
                return Ok(None);
            },
            _ => {},
        }
        self.handle_modal_editor_key(key)
    }

    fn handle_results_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('t') => {
                self.view_mode = self.view_mode.toggle();
                self.reset_search();
            },
            KeyCode::Char('m') => {
                self.display_mode = self.display_mode.cycle();
                self.results_scroll = 0;
                self.reset_search();
            },
            KeyCode::Char('/') => {
                self.prev_focus = self.focus;
                self.search.reset();
                self.search.active = true;
                self.focus = Focus::SearchBox;
                // The term field must own every plain key while typing, so
                // the mode-layer bindings (quit among them) go inert.
                self.mode = Mode::Insert;
                return Ok(Some(Action::ModeChanged(Mode::Insert)));
            },
            KeyCode::Char('n') => self.search.next(),
            KeyCode::Char('N') => self.search.previous(),
            KeyCode::Char('j') | KeyCode::Down => self.results_scroll = self.results_scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.results_scroll = self.results_scroll.saturating_sub(1),
            KeyCode::PageDown => self.results_scroll = self.results_scroll.saturating_add(10),
            KeyCode::PageUp => self.results_scroll = self.results_scroll.saturating_sub(10),
            KeyCode::Char('g') => self.results_scroll = 0,
            KeyCode::Char('G') => self.results_scroll = u16::MAX, // clamped at render
            KeyCode::Char('y') => self.copy_results(false),
            KeyCode::Char('Y') => self.copy_results(true),
            _ => {},
        }
        Ok(None)
    }

    fn handle_history_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let len = self.history.entries().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if len > 0 && self.history_index + 1 < len {
                    self.history_index += 1;
                }
            },
            KeyCode::Char('k') | KeyCode::Up => self.history_index = self.history_index.saturating_sub(1),
            KeyCode::Char('g') => self.history_index = 0,
            KeyCode::Char('G') => self.history_index = len.saturating_sub(1),
            KeyCode::Enter => {
                if let Some(entry) = self.history.entries().get(self.history_index) {
                    let query = entry.query.clone();
                    self.switch_tab(Tab::Query);
                    return Ok(Some(Action::SetQueryText(query)));
                }
            },
            KeyCode::Char('f') => {
                if let Some(entry) = self.history.entries().get(self.history_index) {
                    let query = entry.query.clone();
                    let added = self.favorites.toggle(&query);
                    self.set_status(if added { "added to favorites" } else { "removed from favorites" });
                }
            },
            _ => {},
        }
        Ok(None)
    }

    fn handle_favorites_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let len = self.favorites.entries().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if len > 0 && self.favorites_index + 1 < len {
                    self.favorites_index += 1;
                }
            },
            KeyCode::Char('k') | KeyCode::Up => self.favorites_index = self.favorites_index.saturating_sub(1),
            KeyCode::Enter => {
                if let Some(query) = self.favorites.entries().get(self.favorites_index) {
                    let query = query.clone();
                    self.switch_tab(Tab::Query);
                    return Ok(Some(Action::SetQueryText(query)));
                }
            },
            KeyCode::Char('d') | KeyCode::Char('x') => {
                self.favorites.remove_at(self.favorites_index);
                self.favorites_index = self.favorites_index.min(self.favorites.entries().len().saturating_sub(1));
            },
            _ => {},
        }
        Ok(None)
    }

    /// Activating a table writes a qualified reference into the editor:
    /// replace the whole buffer with a starter query unless the user already
    /// has a SELECT in progress, in which case the reference is appended.
    fn insert_table_reference(&mut self, namespace: &str, table: &str) {
        let current = self.editor.get_text();
        let trimmed = current.trim();
        let qualified = format!("{namespace}.{table}");
        if trimmed.is_empty() || !trimmed.to_lowercase().starts_with("select") {
            self.editor.set_text(&format!("SELECT * FROM {qualified}"));
        } else {
            self.editor.set_text(&format!("{} {qualified}", current.trim_end()));
        }
    }

    pub(super) fn recompute_suggestions(&mut self) {
        let items = self.completion.suggest(&self.editor.get_text());
        self.autocomplete.activate(items);
    }

    pub(super) fn rebuild_completion_index(&mut self) {
        self.completion.update_index(&self.sidebar);
    }

    pub(super) fn reset_search(&mut self) {
        self.search.reset();
        self.metadata_filtered = None;
        self.search_debounce.reset();
    }

    /// Re-run the active term against whatever collection the results pane is
    /// currently showing. Called on the debounce edge and on new results.
    pub(super) fn recompute_search(&mut self) {
        let term = parse_term(&self.search.term);
        let Some(result) = &self.result else {
            self.search.set_matches(Vec::new());
            self.metadata_filtered = None;
            return;
        };
        match self.display_mode {
            DisplayMode::Data => {
                let matches = search::filter_rows(&result.column_names(), &result.rows, &term);
                self.search.set_matches(matches);
            },
            DisplayMode::Schema => {
                let fields = result.schema.as_deref().unwrap_or(&[]);
                let matches = search::filter_schema(fields, &term);
                self.search.set_matches(matches);
            },
            DisplayMode::Headers => {
                let headers = result.headers.as_deref().unwrap_or(&[]);
                let matches = search::filter_headers(headers, &term);
                self.search.set_matches(matches);
            },
            DisplayMode::Metadata => {
                self.metadata_filtered =
                    result.metadata.as_ref().and_then(|m| search::filter_metadata(m, &self.search.term));
                self.search.set_matches(Vec::new());
            },
        }
    }

    fn copy_results(&mut self, as_json: bool) {
        let Some(result) = &self.result else {
            return;
        };
        if result.rows.is_empty() {
            return;
        }
        let columns = result.column_names();
        let text = if as_json {
            serde_json::to_string_pretty(&result.rows).unwrap_or_default()
        } else {
            let mut out = columns.join("\t");
            for row in &result.rows {
                out.push('\n');
                let line: Vec<String> = columns
                    .iter()
                    .map(|c| crate::render::value_string(row.get(c).unwrap_or(&Value::Null)))
                    .collect();
                out.push_str(&line.join("\t"));
            }
            out
        };
        self.copy_to_clipboard(text, if as_json { "rows as JSON" } else { "rows as TSV" });
    }

    fn copy_to_clipboard(&mut self, text: String, what: &str) {
        let copied: Result<(), Box<dyn std::error::Error>> = (|| {
            let mut ctx: clipboard::ClipboardContext = ClipboardProvider::new()?;
            ctx.set_contents(text)
        })();
        // Clipboard trouble is transient status, not a sticky error.
        match copied {
            Ok(()) => self.set_status(format!("{what} copied")),
            Err(e) => self.set_status(format!("clipboard unavailable: {e}")),
        }
    }

    pub(super) fn poll_debounced_work(&mut self) {
        if self.search_debounce.should_execute() {
            self.recompute_search();
        }
        if self.autocomplete_debounce.should_execute() && self.autocomplete.is_active {
            self.recompute_suggestions();
        }
    }
}
