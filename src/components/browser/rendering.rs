//! Frame rendering. Pure projection of the browser's state; nothing in here
//! mutates anything except scroll clamping.

use color_eyre::eyre::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::{Browser, Focus, Tab};
use crate::{
    autocomplete::SuggestionKind,
    render,
    sidebar::SidebarRow,
};

const EDITOR_HEIGHT: u16 = 8;

impl Browser {
    pub fn render(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        self.render_title(f, outer[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(20), Constraint::Percentage(80)])
            .split(outer[1]);
        self.render_sidebar(f, body[0]);

        let search_height = if self.focus == Focus::SearchBox || self.search.active { 1 } else { 0 };
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(EDITOR_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(search_height),
            ])
            .split(body[1]);

        self.render_tabs(f, right[0]);
        match self.active_tab {
            Tab::Query => self.editor.draw(f, right[1], self.focus == Focus::QueryEditor),
            Tab::History => self.render_history(f, right[1]),
            Tab::Favorites => self.render_favorites(f, right[1]),
        }
        self.render_results(f, right[2]);
        if search_height > 0 {
            self.render_search_line(f, right[3]);
        }
        self.render_status(f, outer[2]);

        if self.autocomplete.is_active && self.active_tab == Tab::Query {
            self.render_autocomplete_popup(f, right[1], right[2]);
        }
        if self.show_help {
            self.render_help(f, area);
        }
        Ok(())
    }

    fn render_title(&self, f: &mut Frame<'_>, area: Rect) {
        let mut spans = vec![
            Span::styled(" tablescope ", tablescope_theme::title()),
            Span::styled(format!("[{}] ", self.mode), tablescope_theme::info()),
        ];
        if self.is_query_running {
            let elapsed = self.query_elapsed().map(|d| d.as_secs_f64()).unwrap_or(0.0);
            spans.push(Span::styled(format!("query running {elapsed:.1}s "), tablescope_theme::warning()));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_sidebar(&mut self, f: &mut Frame<'_>, area: Rect) {
        let focused = self.focus == Focus::Sidebar;
        let rows = self.sidebar.flat_rows();
        let mut items: Vec<ListItem<'_>> = rows
            .iter()
            .map(|row| match row {
                SidebarRow::Namespace { name, expanded, loading } => {
                    let marker = if *loading { "… " } else if *expanded { "▾ " } else { "▸ " };
                    ListItem::new(Line::from(vec![
                        Span::styled(marker.to_string(), tablescope_theme::muted()),
                        Span::styled(name.clone(), tablescope_theme::header()),
                    ]))
                },
                SidebarRow::Table { name, .. } => {
                    ListItem::new(Line::from(vec![Span::raw("    "), Span::styled(name.clone(), tablescope_theme::input())]))
                },
            })
            .collect();
        if rows.is_empty() {
            let note = if self.sidebar.loading_namespaces { "loading namespaces…" } else { "no namespaces" };
            items.push(ListItem::new(Span::styled(note, tablescope_theme::muted())));
        }

        let mut title = " catalog ".to_string();
        if let Some(error) = &self.sidebar.error {
            title = format!(" catalog ({error}) ");
        }
        let border = if focused { tablescope_theme::border_focused() } else { tablescope_theme::border_normal() };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).border_style(border).title(title))
            .highlight_style(tablescope_theme::selection_active());
        let mut state = ListState::default();
        if !rows.is_empty() {
            state.select(Some(self.sidebar.selected));
        }
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_tabs(&self, f: &mut Frame<'_>, area: Rect) {
        let mut spans: Vec<Span<'_>> = Vec::new();
        for tab in Tab::ALL {
            let style = if tab == self.active_tab { tablescope_theme::tab_selected() } else { tablescope_theme::tab_normal() };
            spans.push(Span::styled(format!(" {}:{} ", tab.index() + 2, tab.label()), style));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_history(&mut self, f: &mut Frame<'_>, area: Rect) {
        let focused = self.focus == Focus::HistoryList;
        let items: Vec<ListItem<'_>> = self
            .history
            .entries()
            .iter()
            .map(|e| {
                let when = chrono::DateTime::from_timestamp(e.timestamp, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{when}  "), tablescope_theme::muted()),
                    Span::raw(e.query.replace('\n', " ")),
                ]))
            })
            .collect();
        let border = if focused { tablescope_theme::border_focused() } else { tablescope_theme::border_normal() };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).border_style(border).title(" history "))
            .highlight_style(tablescope_theme::selection_active());
        let mut state = ListState::default();
        if !self.history.entries().is_empty() {
            state.select(Some(self.history_index.min(self.history.entries().len() - 1)));
        }
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_favorites(&mut self, f: &mut Frame<'_>, area: Rect) {
        let focused = self.focus == Focus::FavoritesList;
        let items: Vec<ListItem<'_>> =
            self.favorites.entries().iter().map(|q| ListItem::new(q.replace('\n', " "))).collect();
        let border = if focused { tablescope_theme::border_focused() } else { tablescope_theme::border_normal() };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).border_style(border).title(" favorites "))
            .highlight_style(tablescope_theme::selection_active());
        let mut state = ListState::default();
        if !self.favorites.entries().is_empty() {
            state.select(Some(self.favorites_index.min(self.favorites.entries().len() - 1)));
        }
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_results(&mut self, f: &mut Frame<'_>, area: Rect) {
        let focused = self.focus == Focus::ResultsPane;
        let border = if focused { tablescope_theme::border_focused() } else { tablescope_theme::border_normal() };
        let mut title = format!(" results [{}] ", self.display_mode.label());
        if let Some((ns, table, _)) = &self.table_meta {
            title = format!(" results [{}] {ns}.{table} ", self.display_mode.label());
        }
        if let Some((ns, table)) = &self.pending_table {
            title = format!(" results [{}] {ns}.{table} (loading…) ", self.display_mode.label());
        }
        let block = Block::default().borders(Borders::ALL).border_style(border).title(title);
        let inner_width = area.width.saturating_sub(2);

        let text: Text<'static> = match &self.result {
            Some(result) => render::render_result(
                result,
                self.view_mode,
                self.display_mode,
                inner_width,
                &self.search,
                self.metadata_filtered.as_ref(),
            ),
            None => {
                let hint = if self.is_query_running {
                    "executing query…"
                } else {
                    "no results yet; select a table or run a query (Ctrl+E)"
                };
                Text::from(Span::styled(hint, tablescope_theme::muted()))
            },
        };

        // Clamp the scroll so G lands on the last page instead of past it.
        let visible = area.height.saturating_sub(2);
        let max_scroll = (text.lines.len() as u16).saturating_sub(visible);
        if self.results_scroll > max_scroll {
            self.results_scroll = max_scroll;
        }
        let paragraph = Paragraph::new(text).block(block).scroll((self.results_scroll, 0));
        f.render_widget(paragraph, area);
    }

    fn render_search_line(&self, f: &mut Frame<'_>, area: Rect) {
        let typing = self.focus == Focus::SearchBox;
        let mut spans = vec![
            Span::styled("/", tablescope_theme::info()),
            Span::styled(self.search.term.clone(), tablescope_theme::input()),
        ];
        if typing {
            spans.push(Span::styled("▏", tablescope_theme::info()));
        } else if !self.search.matches.is_empty() {
            spans.push(Span::styled(
                format!("  [{}/{}]", self.search.current + 1, self.search.matches.len()),
                tablescope_theme::muted(),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_status(&self, f: &mut Frame<'_>, area: Rect) {
        let line = if let Some(error) = &self.error_message {
            Line::styled(format!(" {error}"), tablescope_theme::error())
        } else if let Some((status, _)) = &self.status_message {
            Line::styled(format!(" {status}"), tablescope_theme::info())
        } else {
            Line::styled(
                " 1:catalog 2:query 3:results 4:history 5:favorites  /:search t:layout m:section ?:help",
                tablescope_theme::muted(),
            )
        };
        f.render_widget(Paragraph::new(line), area);
    }

    fn render_autocomplete_popup(&self, f: &mut Frame<'_>, editor_area: Rect, results_area: Rect) {
        if self.autocomplete.suggestions.is_empty() {
            return;
        }
        let height = (self.autocomplete.suggestions.len() as u16 + 2).min(results_area.height);
        let width = self
            .autocomplete
            .suggestions
            .iter()
            .map(|s| s.text.len() as u16 + 14)
            .max()
            .unwrap_or(20)
            .min(results_area.width);
        let popup = Rect {
            x: editor_area.x + 2,
            y: results_area.y,
            width,
            height,
        };
        let items: Vec<ListItem<'_>> = self
            .autocomplete
            .suggestions
            .iter()
            .map(|s| {
                let kind = match s.kind {
                    SuggestionKind::Keyword => "keyword",
                    SuggestionKind::Namespace => "namespace",
                    SuggestionKind::Table => "table",
                    SuggestionKind::Operator => "operator",
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{kind:<10}"), tablescope_theme::muted()),
                    Span::raw(s.text.clone()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).border_style(tablescope_theme::border_focused()))
            .highlight_style(tablescope_theme::selection_active());
        let mut state = ListState::default();
        state.select(Some(self.autocomplete.selected_index));
        f.render_widget(Clear, popup);
        f.render_stateful_widget(list, popup, &mut state);
    }

    fn render_help(&self, f: &mut Frame<'_>, area: Rect) {
        let popup = centered_rect(70, 80, area);
        let bindings = [
            ("1-5", "focus catalog / query / results / history / favorites"),
            ("i a A I o", "enter insert mode in the editor"),
            ("v", "visual selection in the editor"),
            ("Esc", "leave insert/visual, dismiss popup, clear filter"),
            ("Enter / Ctrl+E", "execute the query"),
            ("Ctrl+Space", "completion popup"),
            ("t", "toggle table/list layout"),
            ("m", "cycle data/schema/headers/metadata"),
            ("/", "search the visible results"),
            ("n / N", "next / previous match"),
            ("y / Y", "copy rows as TSV / JSON"),
            ("f", "toggle favorite"),
            ("r", "reload namespaces (sidebar)"),
            ("q", "quit"),
        ];
        let mut lines = vec![Line::styled("key bindings", tablescope_theme::title()), Line::raw("")];
        for (keys, what) in bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:<16}"), tablescope_theme::header()),
                Span::raw(what),
            ]));
        }
        let help = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).border_style(tablescope_theme::border_focused()).title(" help "));
        f.render_widget(Clear, popup);
        f.render_widget(help, popup);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
