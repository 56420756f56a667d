//! Context-aware query completion fed by the live catalog index.
//!
//! Suggestions are recomputed from the full editor text on request (or after
//! the debounce window); the provider looks backwards for the last SQL
//! keyword and offers whatever makes sense after it.

use crate::sidebar::SidebarTree;

pub const MAX_SUGGESTIONS: usize = 15;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SuggestionKind {
  Keyword,
  Namespace,
  Table,
  Operator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionItem {
  pub text: String,
  pub kind: SuggestionKind,
}

impl SuggestionItem {
  fn keyword(text: &str) -> Self {
    Self { text: text.to_string(), kind: SuggestionKind::Keyword }
  }

  fn operator(text: &str) -> Self {
    Self { text: text.to_string(), kind: SuggestionKind::Operator }
  }
}

/// Popup selection state. Lives on the browser; the provider below is
/// stateless apart from its catalog index.
#[derive(Debug, Default)]
pub struct AutocompleteState {
  pub suggestions: Vec<SuggestionItem>,
  pub selected_index: usize,
  pub is_active: bool,
}

impl AutocompleteState {
  pub fn activate(&mut self, suggestions: Vec<SuggestionItem>) {
    self.is_active = !suggestions.is_empty();
    self.suggestions = suggestions;
    self.selected_index = 0;
  }

  pub fn deactivate(&mut self) {
    self.is_active = false;
    self.suggestions.clear();
    self.selected_index = 0;
  }

  pub fn select_next(&mut self) {
    if !self.suggestions.is_empty() {
      self.selected_index = (self.selected_index + 1) % self.suggestions.len();
    }
  }

  pub fn select_previous(&mut self) {
    if !self.suggestions.is_empty() {
      self.selected_index = (self.selected_index + self.suggestions.len() - 1) % self.suggestions.len();
    }
  }

  pub fn get_selected(&self) -> Option<&SuggestionItem> {
    self.suggestions.get(self.selected_index)
  }
}

/// Catalog-backed suggestion source. The index mirrors the sidebar tree in
/// discovery order so suggestion order is stable across recomputes.
#[derive(Debug, Default)]
pub struct AutocompleteProvider {
  index: Vec<(String, Vec<String>)>,
}

const CONTEXT_KEYWORDS: [&str; 5] = ["select", "from", "where", "order by", "limit"];
const GRAMMAR: [&str; 5] = ["SELECT", "FROM", "WHERE", "ORDER BY", "LIMIT"];
const WHERE_OPERATORS: [&str; 6] = ["AND", "OR", "NOT", "LIKE", "IS NULL", "IS NOT NULL"];

impl AutocompleteProvider {
  pub fn new() -> Self {
    Self::default()
  }

  /// Rebuild the index from the sidebar tree. Called whenever a table
  /// listing arrives so completions track the catalog without re-fetching.
  pub fn update_index(&mut self, tree: &SidebarTree) {
    self.index = tree
      .namespaces()
      .map(|ns| (ns.to_string(), tree.tables_of(ns).map(|t| t.to_vec()).unwrap_or_default()))
      .collect();
  }

  /// The word being completed: trailing run of identifier chars (dots
  /// included so `ns.tab` completes as one unit).
  fn trailing_word(text: &str) -> &str {
    let start = text
      .char_indices()
      .rev()
      .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '.'))
      .map(|(i, c)| i + c.len_utf8())
      .unwrap_or(0);
    &text[start..]
  }

  /// The last context keyword before the cursor, by byte offset.
  fn last_keyword(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    CONTEXT_KEYWORDS
      .iter()
      .filter_map(|kw| lower.rfind(kw).map(|at| (at, *kw)))
      .max_by_key(|(at, _)| *at)
      .map(|(_, kw)| kw)
  }

  fn qualified_tables(&self) -> impl Iterator<Item = SuggestionItem> + '_ {
    self.index.iter().flat_map(|(ns, tables)| {
      tables
        .iter()
        .map(move |t| SuggestionItem { text: format!("{ns}.{t}"), kind: SuggestionKind::Table })
    })
  }

  fn namespaces(&self) -> impl Iterator<Item = SuggestionItem> + '_ {
    self.index.iter().map(|(ns, _)| SuggestionItem { text: ns.clone(), kind: SuggestionKind::Namespace })
  }

  pub fn suggest(&self, text: &str) -> Vec<SuggestionItem> {
    let word = Self::trailing_word(text);
    let word_lower = word.to_lowercase();

    // A dotted word is always a table reference scoped to its namespace.
    if let Some((ns_part, table_part)) = word.split_once('.') {
      let table_lower = table_part.to_lowercase();
      let items = self
        .index
        .iter()
        .filter(|(ns, _)| ns.to_lowercase() == ns_part.to_lowercase())
        .flat_map(|(ns, tables)| {
          tables
            .iter()
            .filter(|t| t.to_lowercase().starts_with(&table_lower))
            .map(move |t| SuggestionItem { text: format!("{ns}.{t}"), kind: SuggestionKind::Table })
        })
        .collect();
      return cap(items);
    }

    let items: Vec<SuggestionItem> = match Self::last_keyword(text) {
      Some("select") if !text.to_lowercase().contains("from") => {
        vec![SuggestionItem::keyword("*"), SuggestionItem::keyword("FROM")]
      },
      // A rightmost `select` with a `from` already present (subqueries) is
      // table position, same as `from` itself.
      Some("select") | Some("from") => self
        .qualified_tables()
        .chain(self.namespaces())
        .filter(|s| s.text.to_lowercase().starts_with(&word_lower))
        .collect(),
      Some("where") => WHERE_OPERATORS
        .iter()
        .map(|op| SuggestionItem::operator(op))
        .filter(|s| word.is_empty() || s.text.to_lowercase().starts_with(&word_lower))
        .collect(),
      Some("order by") => vec![SuggestionItem::keyword("ASC"), SuggestionItem::keyword("DESC")]
        .into_iter()
        .filter(|s| word.is_empty() || s.text.to_lowercase().starts_with(&word_lower))
        .collect(),
      _ => {
        let mut out: Vec<SuggestionItem> = GRAMMAR
          .iter()
          .map(|kw| SuggestionItem::keyword(kw))
          .filter(|s| word.is_empty() || s.text.to_lowercase().starts_with(&word_lower))
          .collect();
        // Catalog names only once the user has started typing something.
        if !word.is_empty() {
          out.extend(
            self
              .namespaces()
              .chain(self.qualified_tables())
              .filter(|s| s.text.to_lowercase().starts_with(&word_lower)),
          );
        }
        out
      },
    };
    cap(items)
  }

  /// Splice an accepted suggestion into the text, replacing the word being
  /// completed. Accepting a qualified table into an empty-ish buffer expands
  /// to a full starter query.
  pub fn accept(text: &str, suggestion: &SuggestionItem) -> String {
    let word = Self::trailing_word(text);
    let base = &text[..text.len() - word.len()];
    if suggestion.kind == SuggestionKind::Table && !text.to_lowercase().contains("select") {
      return format!("SELECT * FROM {}", suggestion.text);
    }
    format!("{base}{}", suggestion.text)
  }
}

fn cap(items: Vec<SuggestionItem>) -> Vec<SuggestionItem> {
  let mut seen = std::collections::HashSet::new();
  items.into_iter().filter(|s| seen.insert(s.text.clone())).take(MAX_SUGGESTIONS).collect()
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::sidebar::SidebarTree;

  fn provider() -> AutocompleteProvider {
    let mut tree = SidebarTree::new();
    tree.set_namespaces(vec!["sales".into(), "ops".into()]);
    tree.tables_loaded("sales", vec!["orders".into(), "refunds".into()]);
    tree.tables_loaded("ops", vec!["incidents".into()]);
    let mut provider = AutocompleteProvider::new();
    provider.update_index(&tree);
    provider
  }

  fn texts(items: &[SuggestionItem]) -> Vec<&str> {
    items.iter().map(|s| s.text.as_str()).collect()
  }

  #[test]
  fn after_select_offers_star_and_from_only() {
    let items = provider().suggest("SELECT ");
    assert_eq!(texts(&items), vec!["*", "FROM"]);
  }

  #[test]
  fn after_from_offers_every_qualified_table_and_namespaces() {
    let items = provider().suggest("SELECT * FROM ");
    let names = texts(&items);
    assert!(names.contains(&"sales.orders"));
    assert!(names.contains(&"sales.refunds"));
    assert!(names.contains(&"ops.incidents"));
    assert!(names.contains(&"sales"));
    assert!(!names.iter().any(|n| *n == "WHERE" || *n == "SELECT"));
  }

  #[test]
  fn from_prefix_narrows_candidates() {
    let items = provider().suggest("SELECT * FROM sa");
    assert_eq!(texts(&items), vec!["sales.orders", "sales.refunds", "sales"]);
  }

  #[test]
  fn dotted_word_completes_within_its_namespace() {
    let items = provider().suggest("SELECT * FROM sales.re");
    assert_eq!(texts(&items), vec!["sales.refunds"]);
  }

  #[test]
  fn multibyte_text_never_splits_a_codepoint() {
    let items = provider().suggest("SELECT 10€");
    assert_eq!(texts(&items), vec!["*", "FROM"]);
    // Multibyte character inside the trailing word's neighborhood.
    let items = provider().suggest("SELECT * FROM café sa");
    assert!(texts(&items).contains(&"sales"));
  }

  #[test]
  fn select_inside_a_subquery_still_offers_tables() {
    let items = provider().suggest("SELECT * FROM (SELECT ");
    let names = texts(&items);
    assert!(names.contains(&"sales.orders"));
    assert!(names.contains(&"ops.incidents"));
    assert!(!names.contains(&"WHERE"));
  }

  #[test]
  fn after_where_offers_operators() {
    let items = provider().suggest("SELECT * FROM sales.orders WHERE ");
    assert!(texts(&items).contains(&"IS NOT NULL"));
    assert!(items.iter().all(|s| s.kind == SuggestionKind::Operator));
  }

  #[test]
  fn after_order_by_offers_directions() {
    let items = provider().suggest("SELECT * FROM t ORDER BY col ");
    assert_eq!(texts(&items), vec!["ASC", "DESC"]);
  }

  #[test]
  fn empty_buffer_offers_grammar_without_catalog_names() {
    let items = provider().suggest("");
    assert!(texts(&items).contains(&"SELECT"));
    assert!(!texts(&items).iter().any(|t| t.contains('.')));
  }

  #[test]
  fn accept_replaces_the_trailing_word() {
    let item = SuggestionItem { text: "sales.orders".into(), kind: SuggestionKind::Table };
    assert_eq!(AutocompleteProvider::accept("SELECT * FROM sales.or", &item), "SELECT * FROM sales.orders");
  }

  #[test]
  fn accepting_table_without_select_builds_starter_query() {
    let item = SuggestionItem { text: "sales.orders".into(), kind: SuggestionKind::Table };
    assert_eq!(AutocompleteProvider::accept("sales.or", &item), "SELECT * FROM sales.orders");
  }

  #[test]
  fn suggestion_count_is_capped() {
    let mut tree = SidebarTree::new();
    tree.set_namespaces(vec!["ns".into()]);
    tree.tables_loaded("ns", (0..40).map(|i| format!("t{i:02}")).collect());
    let mut provider = AutocompleteProvider::new();
    provider.update_index(&tree);
    let items = provider.suggest("SELECT * FROM ");
    assert_eq!(items.len(), MAX_SUGGESTIONS);
  }
}
