//! External collaborators: the catalog service (namespaces, tables, table
//! metadata) and the query service (read-only SQL execution). The core never
//! inspects SQL text; it is posted verbatim and whatever the service reports
//! back is displayed as-is.

use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fully-resolved connection context handed to both clients at construction.
/// There is no ambient global configuration; everything a request needs
/// travels in here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
  #[serde(default)]
  pub account: String,
  #[serde(default)]
  pub bucket: String,
  #[serde(default)]
  pub token: Option<String>,
  #[serde(default = "default_catalog_endpoint")]
  pub catalog_endpoint: String,
  #[serde(default = "default_query_endpoint")]
  pub query_endpoint: String,
}

fn default_catalog_endpoint() -> String {
  "http://localhost:8181".to_string()
}

fn default_query_endpoint() -> String {
  "http://localhost:8191".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
  pub name: String,
  #[serde(rename = "type")]
  pub field_type: String,
  #[serde(default)]
  pub required: bool,
}

/// One query execution's worth of output. Superseded wholesale by the next
/// execution; the browser merges absent sections from the prior result so an
/// empty-row execution does not blank the schema/headers/metadata panes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
  #[serde(default)]
  pub columns: Vec<String>,
  #[serde(default)]
  pub rows: Vec<Map<String, Value>>,
  #[serde(default)]
  pub schema: Option<Vec<SchemaField>>,
  #[serde(default)]
  pub headers: Option<Vec<(String, String)>>,
  #[serde(default)]
  pub metadata: Option<Value>,
  #[serde(default)]
  pub error: Option<String>,
}

impl QueryResult {
  /// Column order for rendering: explicit list if the service sent one,
  /// otherwise schema order, otherwise the keys of the first row.
  pub fn column_names(&self) -> Vec<String> {
    if !self.columns.is_empty() {
      return self.columns.clone();
    }
    if let Some(schema) = &self.schema {
      return schema.iter().map(|f| f.name.clone()).collect();
    }
    self.rows.first().map(|r| r.keys().cloned().collect()).unwrap_or_default()
  }

  /// Carry forward sections the new execution did not report. Rows are never
  /// carried forward; the data pane always reflects the newest execution.
  pub fn inherit_absent_sections(&mut self, prior: &QueryResult) {
    if self.schema.is_none() {
      self.schema = prior.schema.clone();
    }
    if self.headers.is_none() {
      self.headers = prior.headers.clone();
    }
    if self.metadata.is_none() {
      self.metadata = prior.metadata.clone();
    }
  }
}

/// Catalog-reported state of one table: its field list plus the opaque full
/// metadata tree (snapshots, partition specs, whatever the catalog knows).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
  #[serde(default)]
  pub schema: Vec<SchemaField>,
  #[serde(default, rename = "metadata")]
  pub full: Value,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
  async fn list_namespaces(&self) -> Result<Vec<String>>;
  async fn list_tables(&self, namespace: &str) -> Result<Vec<String>>;
  async fn get_table_metadata(&self, namespace: &str, table: &str) -> Result<TableMetadata>;
}

#[async_trait]
pub trait QueryClient: Send + Sync {
  async fn execute(&self, sql: &str) -> Result<QueryResult>;
}

#[derive(Debug, Deserialize)]
struct NamespacesResponse {
  namespaces: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TablesResponse {
  tables: Vec<String>,
}

pub struct HttpCatalogClient {
  http: reqwest::Client,
  ctx: SessionContext,
}

impl HttpCatalogClient {
  pub fn new(ctx: SessionContext) -> Self {
    Self { http: reqwest::Client::new(), ctx }
  }

  fn url(&self, path: &str) -> String {
    format!("{}/v1/{}/{}/{}", self.ctx.catalog_endpoint.trim_end_matches('/'), self.ctx.account, self.ctx.bucket, path)
  }

  fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.ctx.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
  async fn list_namespaces(&self) -> Result<Vec<String>> {
    let resp = self.with_auth(self.http.get(self.url("namespaces"))).send().await?;
    if !resp.status().is_success() {
      return Err(eyre!("catalog error ({}): {}", resp.status(), resp.text().await.unwrap_or_default()));
    }
    let body: NamespacesResponse = resp.json().await?;
    Ok(body.namespaces)
  }

  async fn list_tables(&self, namespace: &str) -> Result<Vec<String>> {
    let resp = self.with_auth(self.http.get(self.url(&format!("namespaces/{namespace}/tables")))).send().await?;
    if !resp.status().is_success() {
      return Err(eyre!("catalog error ({}): {}", resp.status(), resp.text().await.unwrap_or_default()));
    }
    let body: TablesResponse = resp.json().await?;
    Ok(body.tables)
  }

  async fn get_table_metadata(&self, namespace: &str, table: &str) -> Result<TableMetadata> {
    let url = self.url(&format!("namespaces/{namespace}/tables/{table}"));
    let resp = self.with_auth(self.http.get(url)).send().await?;
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
      return Err(eyre!("table {namespace}.{table} not found"));
    }
    if !resp.status().is_success() {
      return Err(eyre!("catalog error ({}): {}", resp.status(), resp.text().await.unwrap_or_default()));
    }
    Ok(resp.json().await?)
  }
}

pub struct HttpQueryClient {
  http: reqwest::Client,
  ctx: SessionContext,
}

impl HttpQueryClient {
  pub fn new(ctx: SessionContext) -> Self {
    Self { http: reqwest::Client::new(), ctx }
  }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
  async fn execute(&self, sql: &str) -> Result<QueryResult> {
    let url = format!("{}/v1/query", self.ctx.query_endpoint.trim_end_matches('/'));
    let payload = serde_json::json!({
      "sql": sql,
      "account": self.ctx.account,
      "bucket": self.ctx.bucket,
    });
    let mut req = self.http.post(url).json(&payload);
    if let Some(token) = &self.ctx.token {
      req = req.bearer_auth(token);
    }
    let resp = req.send().await?;

    // Response headers carry provider diagnostics worth surfacing verbatim.
    let headers: Vec<(String, String)> = resp
      .headers()
      .iter()
      .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("<binary>").to_string()))
      .collect();

    if !resp.status().is_success() {
      let status = resp.status();
      let body = resp.text().await.unwrap_or_default();
      return Err(eyre!("query service error ({status}): {body}"));
    }

    let mut result: QueryResult = resp.json().await?;
    if result.headers.is_none() {
      result.headers = Some(headers);
    }
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  fn row(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  #[test]
  fn column_names_prefer_explicit_list_over_schema() {
    let result = QueryResult {
      columns: vec!["b".into(), "a".into()],
      schema: Some(vec![SchemaField { name: "a".into(), field_type: "long".into(), required: true }]),
      ..Default::default()
    };
    assert_eq!(result.column_names(), vec!["b".to_string(), "a".to_string()]);
  }

  #[test]
  fn column_names_fall_back_to_first_row() {
    let result = QueryResult { rows: vec![row(&[("id", json!(1))])], ..Default::default() };
    assert_eq!(result.column_names(), vec!["id".to_string()]);
  }

  #[test]
  fn inherit_keeps_prior_schema_but_never_rows() {
    let prior = QueryResult {
      rows: vec![row(&[("id", json!(1))])],
      schema: Some(vec![SchemaField { name: "id".into(), field_type: "long".into(), required: true }]),
      metadata: Some(json!({"rowCount": 1})),
      ..Default::default()
    };
    let mut next = QueryResult::default();
    next.inherit_absent_sections(&prior);
    assert_eq!(next.schema, prior.schema);
    assert_eq!(next.metadata, prior.metadata);
    assert!(next.rows.is_empty());
  }

  #[test]
  fn inherit_does_not_overwrite_fresh_sections() {
    let prior = QueryResult { metadata: Some(json!({"rowCount": 1})), ..Default::default() };
    let mut next = QueryResult { metadata: Some(json!({"rowCount": 2})), ..Default::default() };
    next.inherit_absent_sections(&prior);
    assert_eq!(next.metadata, Some(json!({"rowCount": 2})));
  }
}
