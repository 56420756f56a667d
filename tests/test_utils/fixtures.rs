//! Shared builders for browser-level tests.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::json;
use tablescope::{
    catalog::{QueryResult, SchemaField, TableMetadata},
    components::browser::Browser,
    history::{FavoriteStore, HistoryStore},
};

pub fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

pub fn code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

/// A browser with an in-memory history/favorites and a loaded catalog tree.
pub fn browser_with_catalog() -> Browser {
    let mut browser = Browser::new(HistoryStore::default(), FavoriteStore::default());
    browser.sidebar.set_namespaces(vec!["sales".into(), "ops".into()]);
    browser.sidebar.tables_loaded("sales", vec!["orders".into()]);
    browser
}

pub fn sample_result() -> QueryResult {
    serde_json::from_value(json!({
        "columns": ["id", "region"],
        "rows": [
            {"id": 1, "region": "emea"},
            {"id": 2, "region": "apac"},
            {"id": 3, "region": "emea"},
        ],
        "schema": [
            {"name": "id", "type": "long", "required": true},
            {"name": "region", "type": "string", "required": false},
        ],
        "metadata": {"rowCount": 3},
    }))
    .unwrap()
}

pub fn sample_table_metadata() -> TableMetadata {
    TableMetadata {
        schema: vec![
            SchemaField { name: "id".into(), field_type: "long".into(), required: true },
            SchemaField { name: "region".into(), field_type: "string".into(), required: false },
        ],
        full: json!({"format": "v2", "snapshots": [{"id": 10}]}),
    }
}
