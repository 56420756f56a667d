//! State-machine coverage for the browser component: mode and focus
//! transitions, toggle gating, execution epochs, and the search flow.

use std::time::Duration;

use crossterm::event::KeyCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use tablescope::{
    action::Action,
    catalog::QueryResult,
    components::browser::{Browser, Focus, Tab},
    mode::Mode,
    render::{DisplayMode, ViewMode},
};

use crate::test_utils::fixtures::{browser_with_catalog, code, ctrl, key, sample_result, sample_table_metadata};

fn run_query(browser: &mut Browser, sql: &str, result: QueryResult) -> u64 {
    browser.apply(Action::SetQueryText(sql.to_string())).unwrap();
    let handle = browser.apply(Action::ExecuteQuery).unwrap();
    let Some(Action::HandleQuery(epoch, _)) = handle else {
        panic!("expected a query dispatch, got {handle:?}");
    };
    browser.apply(Action::QueryResultReady(epoch, Box::new(result))).unwrap();
    epoch
}

#[test]
fn starts_in_navigation_with_the_sidebar_focused() {
    let browser = Browser::default();
    assert_eq!(browser.mode, Mode::Navigation);
    assert_eq!(browser.active_tab, Tab::Query);
    assert_eq!(browser.focus, Focus::Sidebar);
}

#[test]
fn i_enters_insert_from_anywhere_on_the_query_tab() {
    let mut browser = Browser::default();
    assert_eq!(browser.focus, Focus::Sidebar);
    let out = browser.handle_key(key('i')).unwrap();
    assert_eq!(out, Some(Action::ModeChanged(Mode::Insert)));
    assert_eq!((browser.mode, browser.focus), (Mode::Insert, Focus::QueryEditor));
}

#[test]
fn escape_from_the_editor_returns_to_the_sidebar() {
    let mut browser = Browser::default();
    browser.handle_key(key('i')).unwrap();
    browser.handle_key(code(KeyCode::Esc)).unwrap();
    assert_eq!((browser.mode, browser.focus), (Mode::Navigation, Focus::Sidebar));

    // Navigation-mode editor focus behaves the same.
    browser.handle_key(key('2')).unwrap();
    assert_eq!(browser.focus, Focus::QueryEditor);
    browser.handle_key(code(KeyCode::Esc)).unwrap();
    assert_eq!(browser.focus, Focus::Sidebar);
}

#[test]
fn number_keys_switch_tab_and_focus() {
    let mut browser = Browser::default();
    browser.handle_key(key('4')).unwrap();
    assert_eq!((browser.active_tab, browser.focus), (Tab::History, Focus::HistoryList));
    browser.handle_key(key('5')).unwrap();
    assert_eq!((browser.active_tab, browser.focus), (Tab::Favorites, Focus::FavoritesList));
    browser.handle_key(key('1')).unwrap();
    assert_eq!(browser.focus, Focus::Sidebar);
    browser.handle_key(key('3')).unwrap();
    assert_eq!(browser.focus, Focus::ResultsPane);
    browser.handle_key(key('2')).unwrap();
    assert_eq!((browser.active_tab, browser.focus), (Tab::Query, Focus::QueryEditor));
}

#[test]
fn tab_switching_never_clears_the_editor() {
    let mut browser = Browser::default();
    browser.apply(Action::SetQueryText("SELECT * FROM sales.orders".into())).unwrap();
    browser.handle_key(key('4')).unwrap();
    browser.handle_key(key('5')).unwrap();
    browser.handle_key(key('2')).unwrap();
    assert_eq!(browser.editor.get_text(), "SELECT * FROM sales.orders");
}

#[test]
fn insert_mode_captures_keys_that_navigation_binds() {
    let mut browser = Browser::default();
    let out = browser.handle_key(key('i')).unwrap();
    assert_eq!(out, Some(Action::ModeChanged(Mode::Insert)));
    assert_eq!(browser.mode, Mode::Insert);

    // '1' types instead of switching focus while inserting.
    browser.handle_key(key('1')).unwrap();
    assert_eq!(browser.active_tab, Tab::Query);
    assert_eq!(browser.editor.get_text(), "1");

    let out = browser.handle_key(code(KeyCode::Esc)).unwrap();
    assert_eq!(out, Some(Action::ModeChanged(Mode::Navigation)));
    assert_eq!(browser.mode, Mode::Navigation);
}

#[test]
fn unbound_keys_are_silent_noops() {
    let mut browser = Browser::default();
    browser.handle_key(key('3')).unwrap();
    let before_view = browser.view_mode;
    let out = browser.handle_key(key('z')).unwrap();
    assert_eq!(out, None);
    assert_eq!(browser.view_mode, before_view);
    assert_eq!(browser.editor.get_text(), "");
    // 'q' is a config-keymap concern; the component ignores it.
    assert_eq!(browser.handle_key(key('q')).unwrap(), None);
}

#[test]
fn toggles_require_navigation_mode_and_results_focus() {
    let mut browser = Browser::default();
    browser.handle_key(key('3')).unwrap();
    browser.handle_key(key('t')).unwrap();
    assert_eq!(browser.view_mode, ViewMode::List);
    browser.handle_key(key('m')).unwrap();
    assert_eq!(browser.display_mode, DisplayMode::Schema);

    // In insert mode the same keys type into the editor.
    browser.handle_key(key('2')).unwrap();
    browser.handle_key(key('i')).unwrap();
    browser.handle_key(key('t')).unwrap();
    browser.handle_key(key('m')).unwrap();
    assert_eq!(browser.view_mode, ViewMode::List);
    assert_eq!(browser.display_mode, DisplayMode::Schema);
    assert_eq!(browser.editor.get_text(), "tm");
}

#[test]
fn display_mode_cycle_wraps_around() {
    let mut browser = Browser::default();
    browser.handle_key(key('3')).unwrap();
    for expected in [DisplayMode::Schema, DisplayMode::Headers, DisplayMode::Metadata, DisplayMode::Data] {
        browser.handle_key(key('m')).unwrap();
        assert_eq!(browser.display_mode, expected);
    }
}

#[test]
fn executing_an_empty_query_is_a_noop() {
    let mut browser = Browser::default();
    assert_eq!(browser.apply(Action::ExecuteQuery).unwrap(), None);
    assert!(!browser.is_query_running);
    assert!(browser.history.entries().is_empty());
}

#[test]
fn execute_dispatches_with_a_fresh_epoch_and_records_history() {
    let mut browser = Browser::default();
    browser.apply(Action::SetQueryText("SELECT 1".into())).unwrap();
    let first = browser.apply(Action::ExecuteQuery).unwrap();
    let second = browser.apply(Action::ExecuteQuery).unwrap();
    match (first, second) {
        (Some(Action::HandleQuery(a, _)), Some(Action::HandleQuery(b, _))) => assert!(b > a),
        other => panic!("expected two dispatches, got {other:?}"),
    }
    assert!(browser.is_query_running);
    // Same text twice collapses to one history entry.
    assert_eq!(browser.history.entries().len(), 1);
}

#[test]
fn stale_query_replies_are_dropped() {
    let mut browser = Browser::default();
    browser.apply(Action::SetQueryText("SELECT 1".into())).unwrap();
    browser.apply(Action::ExecuteQuery).unwrap();
    browser.apply(Action::SetQueryText("SELECT 2".into())).unwrap();
    browser.apply(Action::ExecuteQuery).unwrap();

    // Epoch 1 is superseded; its reply must not land.
    let stale = QueryResult { rows: sample_result().rows, ..Default::default() };
    browser.apply(Action::QueryResultReady(1, Box::new(stale))).unwrap();
    assert!(browser.result.is_none());
    assert!(browser.is_query_running);

    browser.apply(Action::QueryResultReady(2, Box::new(sample_result()))).unwrap();
    assert!(!browser.is_query_running);
    assert_eq!(browser.result.as_ref().unwrap().rows.len(), 3);
    assert_eq!(browser.display_mode, DisplayMode::Data);
}

#[test]
fn stale_failures_are_dropped_too() {
    let mut browser = Browser::default();
    run_query(&mut browser, "SELECT 1", sample_result());
    browser.apply(Action::QueryFailed(0, "old boom".into())).unwrap();
    assert_eq!(browser.error_message, None);
}

#[test]
fn empty_row_execution_keeps_prior_schema_and_metadata() {
    let mut browser = Browser::default();
    run_query(&mut browser, "SELECT * FROM sales.orders", sample_result());

    let empty: QueryResult =
        serde_json::from_value(json!({"columns": ["id", "region"], "rows": []})).unwrap();
    run_query(&mut browser, "SELECT * FROM sales.orders WHERE id = 0", empty);

    let result = browser.result.as_ref().unwrap();
    assert!(result.rows.is_empty());
    assert_eq!(result.schema.as_ref().unwrap().len(), 2);
    assert_eq!(result.metadata, Some(json!({"rowCount": 3})));
}

#[test]
fn search_filters_and_cycles_matches() {
    let mut browser = Browser::default();
    run_query(&mut browser, "SELECT 1", sample_result());
    browser.handle_key(key('3')).unwrap();
    browser.handle_key(key('/')).unwrap();
    assert_eq!(browser.focus, Focus::SearchBox);

    for c in "region:emea".chars() {
        browser.handle_key(key(c)).unwrap();
    }
    std::thread::sleep(Duration::from_millis(200));
    browser.apply(Action::Tick).unwrap();
    assert_eq!(browser.search.matches, vec![0, 2]);
    assert_eq!(browser.search.current, 0);

    browser.handle_key(code(KeyCode::Enter)).unwrap();
    assert_eq!(browser.focus, Focus::ResultsPane);
    browser.handle_key(key('n')).unwrap();
    assert_eq!(browser.search.current, 1);
    browser.handle_key(key('n')).unwrap();
    assert_eq!(browser.search.current, 0);
    browser.handle_key(key('N')).unwrap();
    assert_eq!(browser.search.current, 1);

    // Esc clears the applied filter.
    browser.handle_key(code(KeyCode::Esc)).unwrap();
    assert!(browser.search.term.is_empty());
    assert!(!browser.search.active);
}

#[test]
fn search_box_typing_is_shielded_from_mode_layer_bindings() {
    let mut browser = Browser::default();
    run_query(&mut browser, "SELECT 1", sample_result());
    browser.handle_key(key('3')).unwrap();
    let out = browser.handle_key(key('/')).unwrap();
    assert_eq!(out, Some(Action::ModeChanged(Mode::Insert)));

    // 'q' is just another character for the term.
    browser.handle_key(key('q')).unwrap();
    assert_eq!(browser.search.term, "q");

    let out = browser.handle_key(code(KeyCode::Enter)).unwrap();
    assert_eq!(out, Some(Action::ModeChanged(Mode::Navigation)));
    assert_eq!(browser.mode, Mode::Navigation);
}

#[test]
fn escape_in_the_search_box_restores_previous_focus() {
    let mut browser = Browser::default();
    run_query(&mut browser, "SELECT 1", sample_result());
    browser.handle_key(key('3')).unwrap();
    browser.handle_key(key('/')).unwrap();
    browser.handle_key(key('x')).unwrap();
    browser.handle_key(code(KeyCode::Esc)).unwrap();
    assert_eq!(browser.focus, Focus::ResultsPane);
    assert!(browser.search.term.is_empty());
}

#[test]
fn mode_toggles_reset_the_active_search() {
    let mut browser = Browser::default();
    run_query(&mut browser, "SELECT 1", sample_result());
    browser.handle_key(key('3')).unwrap();
    browser.handle_key(key('/')).unwrap();
    browser.handle_key(key('e')).unwrap();
    browser.handle_key(code(KeyCode::Enter)).unwrap();
    browser.handle_key(key('t')).unwrap();
    assert!(browser.search.term.is_empty());
    assert!(!browser.search.active);
}

#[test]
fn help_overlay_swallows_keys_until_dismissed() {
    let mut browser = Browser::default();
    browser.handle_key(key('3')).unwrap();
    browser.handle_key(key('?')).unwrap();
    assert!(browser.show_help);
    browser.handle_key(key('t')).unwrap();
    assert_eq!(browser.view_mode, ViewMode::Table);
    browser.handle_key(code(KeyCode::Esc)).unwrap();
    assert!(!browser.show_help);
}

#[test]
fn selecting_a_table_loads_metadata_and_shows_its_schema() {
    let mut browser = browser_with_catalog();
    browser.handle_key(key('1')).unwrap();
    browser.handle_key(code(KeyCode::Enter)).unwrap(); // expand "sales"
    browser.handle_key(key('j')).unwrap();
    let out = browser.handle_key(code(KeyCode::Enter)).unwrap();
    assert_eq!(out, Some(Action::LoadTableMetadata("sales".into(), "orders".into())));

    // Selecting a table also writes a starter query into the empty editor.
    assert_eq!(browser.editor.get_text(), "SELECT * FROM sales.orders");

    browser
        .apply(Action::TableMetadataLoaded("sales".into(), "orders".into(), sample_table_metadata()))
        .unwrap();
    assert_eq!(browser.display_mode, DisplayMode::Schema);
    assert_eq!(browser.focus, Focus::ResultsPane);
    let result = browser.result.as_ref().unwrap();
    assert_eq!(result.schema.as_ref().unwrap().len(), 2);
    assert!(result.metadata.is_some());
}

#[test]
fn selecting_a_table_appends_when_a_select_is_in_progress() {
    let mut browser = browser_with_catalog();
    browser.apply(Action::SetQueryText("SELECT id FROM".into())).unwrap();
    browser.handle_key(key('1')).unwrap();
    browser.handle_key(code(KeyCode::Enter)).unwrap(); // expand "sales"
    browser.handle_key(key('j')).unwrap();
    browser.handle_key(code(KeyCode::Enter)).unwrap();
    assert_eq!(browser.editor.get_text(), "SELECT id FROM sales.orders");
}

#[test]
fn metadata_for_an_unselected_table_is_ignored() {
    let mut browser = browser_with_catalog();
    browser.apply(Action::TableMetadataLoaded("ops".into(), "x".into(), sample_table_metadata())).unwrap();
    assert!(browser.result.is_none());
    assert!(browser.table_meta.is_none());
}

#[test]
fn completion_popup_navigates_and_accepts() {
    let mut browser = browser_with_catalog();
    browser.apply(Action::NamespacesLoaded(vec!["sales".into()])).unwrap();
    browser.apply(Action::TablesLoaded("sales".into(), vec!["orders".into()])).unwrap();

    browser.handle_key(key('i')).unwrap();
    for c in "SELECT * FROM sales.".chars() {
        browser.handle_key(key(c)).unwrap();
    }
    browser.handle_key(ctrl(' ')).unwrap();
    assert!(browser.autocomplete.is_active);
    browser.handle_key(code(KeyCode::Tab)).unwrap();
    assert_eq!(browser.editor.get_text(), "SELECT * FROM sales.orders");
    assert!(!browser.autocomplete.is_active);
}

#[test]
fn escape_dismisses_the_popup_before_leaving_insert() {
    let mut browser = browser_with_catalog();
    browser.handle_key(key('i')).unwrap();
    browser.handle_key(ctrl(' ')).unwrap();
    assert!(browser.autocomplete.is_active);
    browser.handle_key(code(KeyCode::Esc)).unwrap();
    assert!(!browser.autocomplete.is_active);
    assert_eq!(browser.mode, Mode::Insert);
    browser.handle_key(code(KeyCode::Esc)).unwrap();
    assert_eq!(browser.mode, Mode::Navigation);
}

#[test]
fn ctrl_e_executes_from_insert_mode() {
    let mut browser = Browser::default();
    browser.handle_key(key('i')).unwrap();
    for c in "SELECT 1".chars() {
        browser.handle_key(key(c)).unwrap();
    }
    let out = browser.handle_key(ctrl('e')).unwrap();
    assert_eq!(out, Some(Action::ExecuteQuery));
    assert_eq!(browser.mode, Mode::Insert);
}

#[test]
fn copying_results_reports_through_the_transient_status_line() {
    let mut browser = Browser::default();
    run_query(&mut browser, "SELECT 1", sample_result());
    browser.handle_key(key('3')).unwrap();
    browser.handle_key(key('y')).unwrap();
    // Success and clipboard unavailability both go through the status line
    // that expires on its own; neither is a sticky error.
    assert_eq!(browser.error_message, None);
    assert!(browser.status_message.is_some());
}

#[test]
fn history_entry_recall_switches_to_the_query_tab() {
    let mut browser = Browser::default();
    run_query(&mut browser, "SELECT 1", sample_result());
    browser.handle_key(key('4')).unwrap();
    let out = browser.handle_key(code(KeyCode::Enter)).unwrap();
    assert_eq!(out, Some(Action::SetQueryText("SELECT 1".into())));
    assert_eq!((browser.active_tab, browser.focus), (Tab::Query, Focus::QueryEditor));
}
