//! Action application. Everything that arrives from the event loop or from
//! spawned catalog/query tasks lands here; key handling lives in handlers.rs.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result;

use super::{Browser, Focus, STATUS_MESSAGE_SECS};
use crate::{
    action::Action,
    catalog::QueryResult,
    render::DisplayMode,
};

impl Browser {
    pub fn apply(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => {
                self.poll_debounced_work();
                if let Some((_, since)) = &self.status_message {
                    if since.elapsed() > Duration::from_secs(STATUS_MESSAGE_SECS) {
                        self.status_message = None;
                    }
                }
            },
            Action::Refresh => return Ok(Some(Action::LoadNamespaces)),
            Action::Help => self.show_help = !self.show_help,
            Action::ModeChanged(mode) => self.mode = mode,
            Action::Error(message) => {
                self.is_query_running = false;
                self.error_message = Some(message);
            },
            Action::StatusMessage(message) => self.set_status(message),

            Action::NamespacesLoaded(names) => {
                self.sidebar.set_namespaces(names);
                // The app fans out one table-list request per namespace right
                // after this; mark them all in flight.
                self.sidebar.begin_prefetch();
                self.rebuild_completion_index();
            },
            Action::TablesLoaded(namespace, tables) => {
                self.sidebar.tables_loaded(&namespace, tables);
                self.rebuild_completion_index();
            },
            Action::TableListFailed(namespace, error) => {
                self.sidebar.load_failed(&namespace, &error);
            },
            Action::TableMetadataLoaded(namespace, table, meta) => {
                // Only the most recently selected table may populate the pane.
                if self.pending_table.as_ref() != Some(&(namespace.clone(), table.clone())) {
                    return Ok(None);
                }
                self.pending_table = None;
                let mut shown = QueryResult {
                    schema: Some(meta.schema.clone()),
                    ..Default::default()
                };
                if !meta.full.is_null() {
                    shown.metadata = Some(meta.full.clone());
                }
                self.table_meta = Some((namespace, table, meta));
                self.result = Some(shown);
                self.display_mode = DisplayMode::Schema;
                self.results_scroll = 0;
                self.reset_search();
                self.focus = Focus::ResultsPane;
            },

            Action::ExecuteQuery => {
                let sql = self.editor.get_text();
                let sql = sql.trim();
                if sql.is_empty() {
                    return Ok(None);
                }
                self.query_epoch += 1;
                self.is_query_running = true;
                self.query_start = Some(Instant::now());
                self.error_message = None;
                self.history.record(sql);
                self.history_index = self.history.entries().len().saturating_sub(1);
                self.last_executed_query = Some(sql.to_string());
                return Ok(Some(Action::HandleQuery(self.query_epoch, sql.to_string())));
            },
            Action::QueryResultReady(epoch, result) => {
                if epoch != self.query_epoch {
                    return Ok(None); // stale reply from a superseded execution
                }
                self.is_query_running = false;
                self.query_start = None;
                let mut result = *result;
                if let Some(prior) = &self.result {
                    result.inherit_absent_sections(prior);
                }
                self.result = Some(result);
                self.display_mode = DisplayMode::Data;
                self.results_scroll = 0;
                self.reset_search();
            },
            Action::QueryFailed(epoch, error) => {
                if epoch != self.query_epoch {
                    return Ok(None);
                }
                self.is_query_running = false;
                self.query_start = None;
                self.error_message = Some(error);
            },

            Action::SetQueryText(text) => {
                self.editor.set_text(&text);
                self.mode = crate::mode::Mode::Navigation;
            },
            _ => {},
        }
        Ok(None)
    }

    pub fn query_elapsed(&self) -> Option<Duration> {
        self.query_start.map(|at| at.elapsed())
    }
}
