pub mod handlers;
pub mod models;
pub mod rendering;
pub mod state;

pub use models::{Focus, Tab};

use std::time::Instant;

use color_eyre::eyre::Result;
use ratatui::prelude::*;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use super::{editor::QueryEditor, Component};
use crate::{
    action::Action,
    autocomplete::{AutocompleteProvider, AutocompleteState},
    catalog::{QueryResult, TableMetadata},
    config::Config,
    debounce::Debouncer,
    history::{FavoriteStore, HistoryStore},
    mode::Mode,
    render::{DisplayMode, ViewMode},
    search::SearchState,
    sidebar::SidebarTree,
};

const SEARCH_DEBOUNCE_MS: u64 = 150;
const AUTOCOMPLETE_DEBOUNCE_MS: u64 = 200;
const STATUS_MESSAGE_SECS: u64 = 4;

/// The whole client UI: sidebar tree, tabbed editor area, results pane, and
/// the overlays. One component owns all view state so every mode toggle and
/// focus move is a plain field write followed by a redraw.
pub struct Browser {
    pub command_tx: Option<UnboundedSender<Action>>,
    pub config: Config,

    // Modal state
    pub mode: Mode,
    pub focus: Focus,
    prev_focus: Focus,
    pub active_tab: Tab,
    pub show_help: bool,

    // Catalog tree
    pub sidebar: SidebarTree,

    // Query editor and completion
    pub editor: QueryEditor,
    pub autocomplete: AutocompleteState,
    completion: AutocompleteProvider,
    autocomplete_debounce: Debouncer,

    // Results pane
    pub result: Option<QueryResult>,
    pub view_mode: ViewMode,
    pub display_mode: DisplayMode,
    pub results_scroll: u16,
    /// Metadata for the most recently selected table, keyed so a stale reply
    /// for a previously selected table is ignored.
    pub table_meta: Option<(String, String, TableMetadata)>,
    pending_table: Option<(String, String)>,

    // Query execution
    query_epoch: u64,
    pub is_query_running: bool,
    query_start: Option<Instant>,
    pub last_executed_query: Option<String>,

    // Search over the visible collection
    pub search: SearchState,
    search_debounce: Debouncer,
    pub metadata_filtered: Option<Value>,

    // History and favorites
    pub history: HistoryStore,
    pub history_index: usize,
    pub favorites: FavoriteStore,
    pub favorites_index: usize,

    // Transient messages
    pub error_message: Option<String>,
    pub status_message: Option<(String, Instant)>,
}

impl Default for Browser {
    fn default() -> Self {
        Self::new(HistoryStore::default(), FavoriteStore::default())
    }
}

impl Browser {
    pub fn new(history: HistoryStore, favorites: FavoriteStore) -> Self {
        Self {
            command_tx: None,
            config: Config::default(),
            mode: Mode::Navigation,
            focus: Focus::Sidebar,
            prev_focus: Focus::Sidebar,
            active_tab: Tab::Query,
            show_help: false,
            sidebar: SidebarTree::new(),
            editor: QueryEditor::default(),
            autocomplete: AutocompleteState::default(),
            completion: AutocompleteProvider::new(),
            autocomplete_debounce: Debouncer::new(AUTOCOMPLETE_DEBOUNCE_MS),
            result: None,
            view_mode: ViewMode::default(),
            display_mode: DisplayMode::default(),
            results_scroll: 0,
            table_meta: None,
            pending_table: None,
            query_epoch: 0,
            is_query_running: false,
            query_start: None,
            last_executed_query: None,
            search: SearchState::default(),
            search_debounce: Debouncer::new(SEARCH_DEBOUNCE_MS),
            metadata_filtered: None,
            history,
            history_index: 0,
            favorites,
            favorites_index: 0,
            error_message: None,
            status_message: None,
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }
}

impl Component for Browser {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.command_tx = Some(tx);
        Ok(())
    }

    fn register_config_handler(&mut self, config: Config) -> Result<()> {
        self.config = config;
        Ok(())
    }

    fn init(&mut self, _area: Rect) -> Result<()> {
        Ok(())
    }

    fn handle_events(&mut self, event: Option<crate::tui::Event>) -> Result<Option<Action>> {
        match event {
            Some(crate::tui::Event::Key(key)) => self.handle_key_events(key),
            Some(crate::tui::Event::Paste(text)) => {
                if self.mode == Mode::Insert && self.focus == Focus::QueryEditor {
                    self.editor.replace_text(&format!("{}{}", self.editor.get_text(), text));
                }
                Ok(None)
            },
            _ => Ok(None),
        }
    }

    fn handle_key_events(&mut self, key: crossterm::event::KeyEvent) -> Result<Option<Action>> {
        self.handle_key(key)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        self.apply(action)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        self.render(f, area)
    }
}
