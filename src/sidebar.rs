//! Namespace/table tree shown in the sidebar.
//!
//! Nodes are stored as an arena of namespace entries plus the per-namespace
//! table index; the flat list the widget renders is derived from the expanded
//! flags on demand. Collapsing a namespace therefore removes exactly its
//! child run, and indices never go stale between structural changes.

use std::collections::{HashMap, HashSet};

/// One line of the rendered sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarRow {
  Namespace { name: String, expanded: bool, loading: bool },
  Table { namespace: String, name: String },
}

/// What the caller must do after an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarRequest {
  /// Tables for this namespace are not indexed yet; fetch them.
  FetchTables(String),
  /// A table row was activated.
  SelectTable { namespace: String, table: String },
}

#[derive(Debug, Clone)]
struct NamespaceEntry {
  name: String,
  expanded: bool,
}

#[derive(Debug, Default)]
pub struct SidebarTree {
  nodes: Vec<NamespaceEntry>,
  index: HashMap<String, Vec<String>>,
  /// Namespaces with a table-list request in flight (user-issued or
  /// prefetch). Guards against duplicate requests.
  pending: HashSet<String>,
  /// Namespaces the user asked to expand before their tables arrived.
  expand_on_load: HashSet<String>,
  pub selected: usize,
  pub error: Option<String>,
  pub loading_namespaces: bool,
}

impl SidebarTree {
  pub fn new() -> Self {
    Self { loading_namespaces: true, ..Default::default() }
  }

  /// Replace the namespace list (startup load or refresh). Expansion state
  /// survives for namespaces that still exist; the table index for vanished
  /// namespaces is dropped.
  pub fn set_namespaces(&mut self, names: Vec<String>) {
    let expanded: HashSet<String> =
      self.nodes.iter().filter(|n| n.expanded).map(|n| n.name.clone()).collect();
    self.nodes = names
      .into_iter()
      .map(|name| NamespaceEntry { expanded: expanded.contains(&name), name })
      .collect();
    let live: HashSet<&String> = self.nodes.iter().map(|n| &n.name).collect();
    self.index.retain(|ns, _| live.contains(ns));
    self.loading_namespaces = false;
    self.error = None;
    self.clamp_selection();
  }

  /// Mark every namespace as having a request in flight; used when the
  /// startup prefetch fans out so user expands do not re-request.
  pub fn begin_prefetch(&mut self) {
    for node in &self.nodes {
      self.pending.insert(node.name.clone());
    }
  }

  pub fn namespaces(&self) -> impl Iterator<Item = &str> {
    self.nodes.iter().map(|n| n.name.as_str())
  }

  pub fn tables_of(&self, namespace: &str) -> Option<&[String]> {
    self.index.get(namespace).map(|t| t.as_slice())
  }

  /// Flat render order derived from the expanded flags.
  pub fn flat_rows(&self) -> Vec<SidebarRow> {
    let mut rows = Vec::new();
    for node in &self.nodes {
      rows.push(SidebarRow::Namespace {
        name: node.name.clone(),
        expanded: node.expanded,
        loading: self.pending.contains(&node.name),
      });
      if node.expanded {
        if let Some(tables) = self.index.get(&node.name) {
          for table in tables {
            rows.push(SidebarRow::Table { namespace: node.name.clone(), name: table.clone() });
          }
        }
      }
    }
    rows
  }

  pub fn len(&self) -> usize {
    self.flat_rows().len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn selected_row(&self) -> Option<SidebarRow> {
    self.flat_rows().into_iter().nth(self.selected)
  }

  pub fn select_next(&mut self) {
    let len = self.len();
    if len > 0 && self.selected < len - 1 {
      self.selected += 1;
    }
  }

  pub fn select_previous(&mut self) {
    if self.selected > 0 {
      self.selected -= 1;
    }
  }

  pub fn select_first(&mut self) {
    self.selected = 0;
  }

  pub fn select_last(&mut self) {
    self.selected = self.len().saturating_sub(1);
  }

  /// Activate the row at the current selection. Expands/collapses namespaces
  /// and reports table selections; never issues a duplicate fetch while one
  /// is pending.
  pub fn activate_selected(&mut self) -> Option<SidebarRequest> {
    match self.selected_row()? {
      SidebarRow::Namespace { name, expanded, .. } => {
        if expanded {
          self.collapse(&name);
          None
        } else if self.index.contains_key(&name) {
          self.set_expanded(&name, true);
          None
        } else {
          self.expand_on_load.insert(name.clone());
          if self.pending.insert(name.clone()) {
            Some(SidebarRequest::FetchTables(name))
          } else {
            // Prefetch already in flight; it will expand on arrival.
            None
          }
        }
      },
      SidebarRow::Table { namespace, name } => {
        Some(SidebarRequest::SelectTable { namespace, table: name })
      },
    }
  }

  /// A table listing arrived (prefetch or user expand). Replaces any prior
  /// entry for the namespace, so a racing prefetch can never resurrect stale
  /// data over a fresher response.
  pub fn tables_loaded(&mut self, namespace: &str, tables: Vec<String>) {
    self.index.insert(namespace.to_string(), tables);
    self.pending.remove(namespace);
    if self.expand_on_load.remove(namespace) {
      self.set_expanded(namespace, true);
    }
    self.clamp_selection();
  }

  /// A table listing failed: show the error inline and leave the node
  /// collapsed. No partial expansion.
  pub fn load_failed(&mut self, namespace: &str, error: &str) {
    self.pending.remove(namespace);
    self.expand_on_load.remove(namespace);
    self.error = Some(format!("{namespace}: {error}"));
  }

  fn collapse(&mut self, namespace: &str) {
    self.set_expanded(namespace, false);
    self.clamp_selection();
  }

  fn set_expanded(&mut self, namespace: &str, expanded: bool) {
    if let Some(node) = self.nodes.iter_mut().find(|n| n.name == namespace) {
      node.expanded = expanded;
    }
  }

  fn clamp_selection(&mut self) {
    let len = self.len();
    if len == 0 {
      self.selected = 0;
    } else if self.selected >= len {
      self.selected = len - 1;
    }
  }
}
