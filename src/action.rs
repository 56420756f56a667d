use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  catalog::{QueryResult, TableMetadata},
  mode::Mode,
};

#[derive(Debug, Clone, PartialEq, Serialize, Display, Deserialize)]
pub enum Action {
  Tick,
  Render,
  Resize(u16, u16),
  Suspend,
  Resume,
  Quit,
  Refresh,
  Error(String),
  Help,
  ModeChanged(Mode),
  // Catalog traffic
  LoadNamespaces,
  NamespacesLoaded(Vec<String>),
  LoadTables(String),
  TablesLoaded(String, Vec<String>),
  TableListFailed(String, String),
  LoadTableMetadata(String, String),
  TableMetadataLoaded(String, String, TableMetadata),
  // Query traffic; the u64 is the execution epoch used to drop stale replies
  ExecuteQuery,
  HandleQuery(u64, String),
  QueryResultReady(u64, Box<QueryResult>),
  QueryFailed(u64, String),
  // Editor plumbing
  SetQueryText(String),
  StatusMessage(String),
}
