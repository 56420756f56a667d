//! Live search over whatever the results pane currently shows.
//!
//! The same term is interpreted against four shapes: data rows, schema
//! fields, header entries, and the metadata tree. Data/schema/headers
//! produce ordered match index lists for next/previous navigation; metadata
//! produces a structurally filtered copy of the tree.

use serde_json::{Map, Value};

use crate::catalog::SchemaField;

/// Parsed search term. Exactly one `:` means an exact-field filter; zero or
/// more than one means plain substring search (never an error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
  Empty,
  Literal(String),
  Field { column: String, value: String },
}

pub fn parse_term(raw: &str) -> Term {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Term::Empty;
  }
  if trimmed.matches(':').count() == 1 {
    if let Some((column, value)) = trimmed.split_once(':') {
      return Term::Field { column: column.trim().to_lowercase(), value: value.trim().to_lowercase() };
    }
  }
  Term::Literal(trimmed.to_lowercase())
}

/// Stringified form used for matching; mirrors what the renderer prints.
pub fn value_text(value: &Value) -> String {
  match value {
    Value::Null => "NULL".to_string(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn contains(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(needle)
}

/// Data mode: without a column filter, a row matches when any column name or
/// stringified value contains the term; with one, the named column's value
/// must contain the filter value. Original order and indices are kept.
pub fn filter_rows(columns: &[String], rows: &[Map<String, Value>], term: &Term) -> Vec<usize> {
  match term {
    Term::Empty => (0..rows.len()).collect(),
    Term::Literal(needle) => rows
      .iter()
      .enumerate()
      .filter(|(_, row)| {
        columns.iter().any(|c| contains(c, needle))
          || row.values().any(|v| contains(&value_text(v), needle))
      })
      .map(|(i, _)| i)
      .collect(),
    Term::Field { column, value } => rows
      .iter()
      .enumerate()
      .filter(|(_, row)| {
        row
          .iter()
          .find(|(name, _)| name.to_lowercase() == *column)
          .map(|(_, v)| contains(&value_text(v), value))
          .unwrap_or(false)
      })
      .map(|(i, _)| i)
      .collect(),
  }
}

/// Schema mode: a field matches when the term appears in any descriptor key
/// or stringified value.
pub fn filter_schema(fields: &[SchemaField], term: &Term) -> Vec<usize> {
  let needle = match flatten_term(term) {
    Some(n) => n,
    None => return (0..fields.len()).collect(),
  };
  fields
    .iter()
    .enumerate()
    .filter(|(_, f)| {
      ["name", "type", "required"].iter().any(|k| contains(k, &needle))
        || contains(&f.name, &needle)
        || contains(&f.field_type, &needle)
        || contains(&f.required.to_string(), &needle)
    })
    .map(|(i, _)| i)
    .collect()
}

/// Headers mode: key or value substring match.
pub fn filter_headers(headers: &[(String, String)], term: &Term) -> Vec<usize> {
  let needle = match flatten_term(term) {
    Some(n) => n,
    None => return (0..headers.len()).collect(),
  };
  headers
    .iter()
    .enumerate()
    .filter(|(_, (k, v))| contains(k, &needle) || contains(v, &needle))
    .map(|(i, _)| i)
    .collect()
}

// Field syntax is only meaningful against rows; elsewhere the raw term is
// treated as one literal.
fn flatten_term(term: &Term) -> Option<String> {
  match term {
    Term::Empty => None,
    Term::Literal(needle) => Some(needle.clone()),
    Term::Field { column, value } => Some(format!("{column}:{value}")),
  }
}

/// Metadata mode: recursive structural filter. Scalars survive when their
/// stringified form contains the term; arrays keep matching children;
/// objects keep a key verbatim when the key itself matches, otherwise only
/// when the filtered value is non-empty. `None` means nothing survived.
pub fn filter_metadata(value: &Value, term: &str) -> Option<Value> {
  let needle = term.trim().to_lowercase();
  if needle.is_empty() {
    return Some(value.clone());
  }
  filter_metadata_inner(value, &needle)
}

fn filter_metadata_inner(value: &Value, needle: &str) -> Option<Value> {
  match value {
    Value::Array(items) => {
      let kept: Vec<Value> = items.iter().filter_map(|v| filter_metadata_inner(v, needle)).collect();
      if kept.is_empty() {
        None
      } else {
        Some(Value::Array(kept))
      }
    },
    Value::Object(entries) => {
      let mut kept = Map::new();
      for (key, child) in entries {
        if contains(key, needle) {
          kept.insert(key.clone(), child.clone());
        } else if let Some(filtered) = filter_metadata_inner(child, needle) {
          kept.insert(key.clone(), filtered);
        }
      }
      if kept.is_empty() {
        None
      } else {
        Some(Value::Object(kept))
      }
    },
    scalar => {
      if contains(&value_text(scalar), needle) {
        Some(scalar.clone())
      } else {
        None
      }
    },
  }
}

/// Match cursor over the active result collection. Reset whenever the result
/// set, display mode, or view mode changes. `current` is -1 whenever there
/// are no matches.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
  pub active: bool,
  pub term: String,
  pub matches: Vec<usize>,
  pub current: i64,
}

impl Default for SearchState {
  fn default() -> Self {
    Self { active: false, term: String::new(), matches: Vec::new(), current: -1 }
  }
}

impl SearchState {
  pub fn reset(&mut self) {
    *self = Self::default();
  }

  pub fn set_matches(&mut self, matches: Vec<usize>) {
    self.current = if matches.is_empty() { -1 } else { 0 };
    self.matches = matches;
  }

  pub fn current_match(&self) -> Option<usize> {
    if self.current < 0 {
      None
    } else {
      self.matches.get(self.current as usize).copied()
    }
  }

  /// Circular forward step; no-op when there are no matches.
  pub fn next(&mut self) {
    if !self.matches.is_empty() {
      self.current = (self.current + 1).rem_euclid(self.matches.len() as i64);
    }
  }

  /// Circular backward step; no-op when there are no matches.
  pub fn previous(&mut self) {
    if !self.matches.is_empty() {
      self.current = (self.current - 1).rem_euclid(self.matches.len() as i64);
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  fn rows() -> Vec<Map<String, Value>> {
    vec![
      json!({"region": "emea", "total": 42}).as_object().unwrap().clone(),
      json!({"region": "apac", "total": 7}).as_object().unwrap().clone(),
      json!({"region": "amer", "total": 420}).as_object().unwrap().clone(),
    ]
  }

  fn columns() -> Vec<String> {
    vec!["region".into(), "total".into()]
  }

  #[test]
  fn literal_term_matches_names_and_values() {
    let matches = filter_rows(&columns(), &rows(), &parse_term("42"));
    assert_eq!(matches, vec![0, 2]);
    // Column-name hits match every row.
    let matches = filter_rows(&columns(), &rows(), &parse_term("regi"));
    assert_eq!(matches, vec![0, 1, 2]);
  }

  #[test]
  fn field_term_restricts_to_named_column() {
    let matches = filter_rows(&columns(), &rows(), &parse_term("region:a"));
    assert_eq!(matches, vec![1, 2]);
  }

  #[test]
  fn field_term_with_unknown_column_matches_nothing() {
    let matches = filter_rows(&columns(), &rows(), &parse_term("nosuch:42"));
    assert_eq!(matches, Vec::<usize>::new());
  }

  #[test]
  fn double_colon_degrades_to_literal() {
    assert_eq!(parse_term("a:b:c"), Term::Literal("a:b:c".into()));
    let matches = filter_rows(&columns(), &rows(), &Term::Literal("a:b:c".into()));
    assert_eq!(matches, Vec::<usize>::new());
  }

  #[test]
  fn empty_term_clears_the_filter() {
    assert_eq!(parse_term("   "), Term::Empty);
    assert_eq!(filter_rows(&columns(), &rows(), &Term::Empty), vec![0, 1, 2]);
  }

  #[test]
  fn metadata_filter_keeps_matching_branches_only() {
    let tree = json!({"id": "abc", "nested": {"keep": "abc123", "drop": "zzz"}});
    let filtered = filter_metadata(&tree, "abc").unwrap();
    assert_eq!(filtered, json!({"id": "abc", "nested": {"keep": "abc123"}}));
  }

  #[test]
  fn metadata_filter_keeps_matching_key_with_value_verbatim() {
    let tree = json!({"snapshots": {"count": 3}, "other": 1});
    let filtered = filter_metadata(&tree, "snap").unwrap();
    assert_eq!(filtered, json!({"snapshots": {"count": 3}}));
  }

  #[test]
  fn metadata_filter_drops_empty_arrays() {
    let tree = json!({"items": ["zzz", "yyy"], "name": "abc"});
    let filtered = filter_metadata(&tree, "abc").unwrap();
    assert_eq!(filtered, json!({"name": "abc"}));
  }

  #[test]
  fn metadata_filter_returns_none_when_nothing_survives() {
    assert_eq!(filter_metadata(&json!({"a": 1}), "zzz"), None);
  }

  #[test]
  fn match_navigation_cycles_circularly() {
    let mut state = SearchState::default();
    state.set_matches(vec![10, 20, 30]);
    assert_eq!(state.current, 0);
    state.next();
    state.next();
    assert_eq!(state.current, 2);
    state.next();
    assert_eq!(state.current, 0);
    state.previous();
    assert_eq!(state.current, 2);
    state.previous();
    state.previous();
    assert_eq!(state.current, 0);
  }

  #[test]
  fn match_navigation_is_noop_without_matches() {
    let mut state = SearchState::default();
    assert_eq!(state.current, -1);
    state.set_matches(vec![]);
    assert_eq!(state.current, -1);
    state.next();
    state.previous();
    assert_eq!(state.current, -1);
    assert_eq!(state.current_match(), None);
  }
}
