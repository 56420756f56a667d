//! Persistent query history and favorites.
//!
//! History is an append-only JSON-lines log; favorites are a small JSON
//! array rewritten whole on every change. Both stores fail soft: a missing
//! or unwritable file degrades to in-memory behavior, never an error the
//! user has to deal with mid-session.

use std::{
  fs::{self, OpenOptions},
  io::Write,
  path::PathBuf,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub query: String,
  pub timestamp: i64,
}

#[derive(Debug, Default)]
pub struct HistoryStore {
  entries: Vec<HistoryEntry>,
  log_path: Option<PathBuf>,
}

impl HistoryStore {
  /// Load prior sessions' history. Unparseable lines are skipped so one
  /// corrupt entry cannot take out the whole log.
  pub fn load(log_path: Option<PathBuf>) -> Self {
    let mut entries = Vec::new();
    if let Some(path) = &log_path {
      if let Ok(content) = fs::read_to_string(path) {
        entries = content.lines().filter_map(|line| serde_json::from_str(line).ok()).collect();
      }
    }
    Self { entries, log_path }
  }

  pub fn entries(&self) -> &[HistoryEntry] {
    &self.entries
  }

  /// Record an executed query. Blank queries and immediate repeats of the
  /// previous entry are dropped.
  pub fn record(&mut self, query: &str) {
    let query = query.trim();
    if query.is_empty() {
      return;
    }
    if self.entries.last().map(|e| e.query.as_str()) == Some(query) {
      return;
    }
    let entry = HistoryEntry { query: query.to_string(), timestamp: chrono::Utc::now().timestamp() };
    if let Some(path) = &self.log_path {
      if let Err(e) = append_line(path, &entry) {
        warn!("history log write failed: {e}");
      }
    }
    self.entries.push(entry);
  }
}

fn append_line(path: &PathBuf, entry: &HistoryEntry) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut file = OpenOptions::new().create(true).append(true).open(path)?;
  writeln!(file, "{}", serde_json::to_string(entry)?)
}

#[derive(Debug, Default)]
pub struct FavoriteStore {
  entries: Vec<String>,
  path: Option<PathBuf>,
}

impl FavoriteStore {
  pub fn load(path: Option<PathBuf>) -> Self {
    let mut entries = Vec::new();
    if let Some(path) = &path {
      if let Ok(content) = fs::read_to_string(path) {
        entries = serde_json::from_str(&content).unwrap_or_default();
      }
    }
    Self { entries, path }
  }

  pub fn entries(&self) -> &[String] {
    &self.entries
  }

  pub fn contains(&self, query: &str) -> bool {
    self.entries.iter().any(|q| q == query)
  }

  /// Add or remove, then rewrite the file. Returns true when the query is a
  /// favorite after the call.
  pub fn toggle(&mut self, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
      return false;
    }
    let now_favorite = if let Some(at) = self.entries.iter().position(|q| q == query) {
      self.entries.remove(at);
      false
    } else {
      self.entries.push(query.to_string());
      true
    };
    self.persist();
    now_favorite
  }

  pub fn remove_at(&mut self, index: usize) {
    if index < self.entries.len() {
      self.entries.remove(index);
      self.persist();
    }
  }

  fn persist(&self) {
    if let Some(path) = &self.path {
      let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
          fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.entries)?)
      };
      if let Err(e) = write() {
        warn!("favorites write failed: {e}");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn record_skips_blank_and_consecutive_duplicates() {
    let mut store = HistoryStore::default();
    store.record("SELECT 1");
    store.record("   ");
    store.record("SELECT 1");
    store.record("SELECT 2");
    store.record("SELECT 1");
    let queries: Vec<&str> = store.entries().iter().map(|e| e.query.as_str()).collect();
    assert_eq!(queries, vec!["SELECT 1", "SELECT 2", "SELECT 1"]);
  }

  #[test]
  fn history_round_trips_through_the_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    let mut store = HistoryStore::load(Some(path.clone()));
    store.record("SELECT a FROM t");
    store.record("SELECT b FROM t");

    let reloaded = HistoryStore::load(Some(path));
    let queries: Vec<&str> = reloaded.entries().iter().map(|e| e.query.as_str()).collect();
    assert_eq!(queries, vec!["SELECT a FROM t", "SELECT b FROM t"]);
  }

  #[test]
  fn corrupt_log_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    fs::write(&path, "not json\n{\"query\":\"SELECT 1\",\"timestamp\":0}\n").unwrap();
    let store = HistoryStore::load(Some(path));
    assert_eq!(store.entries().len(), 1);
  }

  #[test]
  fn missing_log_path_degrades_to_memory_only() {
    let mut store = HistoryStore::load(None);
    store.record("SELECT 1");
    assert_eq!(store.entries().len(), 1);
  }

  #[test]
  fn favorites_toggle_and_persist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("favorites.json");
    let mut store = FavoriteStore::load(Some(path.clone()));
    assert!(store.toggle("SELECT 1"));
    assert!(store.toggle("SELECT 2"));
    assert!(!store.toggle("SELECT 1"));

    let reloaded = FavoriteStore::load(Some(path));
    assert_eq!(reloaded.entries(), &["SELECT 2".to_string()]);
  }
}
