//! Pure result-pane rendering: takes the stored execution output plus the
//! current view/display modes and produces ratatui text. Nothing in here
//! fetches or mutates; mode toggles just re-run this over cached state.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ratatui::{
  style::Style,
  text::{Line, Span, Text},
};
use serde_json::Value;

use crate::{
  catalog::{QueryResult, SchemaField},
  search::SearchState,
};

pub const NULL_MARKER: &str = "NULL";

/// How the active collection is laid out.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ViewMode {
  #[default]
  Table,
  List,
}

impl ViewMode {
  pub fn toggle(self) -> Self {
    match self {
      Self::Table => Self::List,
      Self::List => Self::Table,
    }
  }
}

/// Which section of the stored result is shown.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum DisplayMode {
  #[default]
  Data,
  Schema,
  Headers,
  Metadata,
}

impl DisplayMode {
  pub fn cycle(self) -> Self {
    match self {
      Self::Data => Self::Schema,
      Self::Schema => Self::Headers,
      Self::Headers => Self::Metadata,
      Self::Metadata => Self::Data,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Data => "data",
      Self::Schema => "schema",
      Self::Headers => "headers",
      Self::Metadata => "metadata",
    }
  }
}

/// Heuristic used to style string values: RFC 3339, plain ISO or slashed
/// dates, and 10-13 digit epoch strings all count.
pub fn is_timestamp_like(s: &str) -> bool {
  if DateTime::parse_from_rfc3339(s).is_ok() {
    return true;
  }
  if NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok() {
    return true;
  }
  if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || NaiveDate::parse_from_str(s, "%Y/%m/%d").is_ok() {
    return true;
  }
  (10..=13).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// One value as the user sees it. Nulls get an explicit marker so an absent
/// value is never confused with an empty string.
pub fn value_string(value: &Value) -> String {
  match value {
    Value::Null => NULL_MARKER.to_string(),
    Value::String(s) => s.clone(),
    Value::Array(_) | Value::Object(_) => value.to_string(),
    other => other.to_string(),
  }
}

fn value_style(value: &Value) -> Style {
  match value {
    Value::Null => tablescope_theme::value_null(),
    Value::Number(_) => tablescope_theme::value_number(),
    Value::Bool(_) => tablescope_theme::value_bool(),
    Value::String(s) if is_timestamp_like(s) => tablescope_theme::value_timestamp(),
    Value::String(_) => tablescope_theme::value_string(),
    Value::Array(_) | Value::Object(_) => tablescope_theme::value_nested(),
  }
}

pub fn value_span(value: &Value) -> Span<'static> {
  Span::styled(value_string(value), value_style(value))
}

fn display_width(s: &str) -> usize {
  s.chars().count()
}

fn fit(s: &str, width: usize) -> String {
  if width == 0 {
    return String::new();
  }
  if display_width(s) <= width {
    let mut out = s.to_string();
    out.extend(std::iter::repeat(' ').take(width - display_width(s)));
    out
  } else {
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
  }
}

/// Execution-stats line built from metadata counters, shown above the data.
pub fn stats_line(metadata: &Value) -> Option<Line<'static>> {
  let obj = metadata.as_object()?;
  let mut parts: Vec<String> = Vec::new();
  for key in ["rowCount", "bytesScanned", "executionTimeMs"] {
    if let Some(v) = obj.get(key) {
      if !v.is_object() && !v.is_array() {
        parts.push(format!("{key}={}", value_string(v)));
      }
    }
  }
  for (key, v) in obj {
    if ["rowCount", "bytesScanned", "executionTimeMs"].contains(&key.as_str()) {
      continue;
    }
    if v.is_number() {
      parts.push(format!("{key}={}", value_string(v)));
    }
  }
  if parts.is_empty() {
    None
  } else {
    Some(Line::styled(parts.join("  "), tablescope_theme::muted()))
  }
}

fn filtered_line(shown: usize, total: usize) -> Line<'static> {
  Line::styled(format!("showing {shown} of {total} (filtered)"), tablescope_theme::info())
}

/// Indices to render for a collection of `total` items under the current
/// search state. An empty term is never a filter, even while the search box
/// is open and waiting for input.
fn visible_indices(search: &SearchState, total: usize) -> Vec<usize> {
  if search.term.trim().is_empty() {
    (0..total).collect()
  } else {
    search.matches.clone()
  }
}

fn row_style(search: &SearchState, index: usize) -> Style {
  if search.current_match() == Some(index) {
    tablescope_theme::selection_active()
  } else {
    Style::default()
  }
}

fn render_data(result: &QueryResult, view: ViewMode, width: u16, search: &SearchState) -> Text<'static> {
  let columns = result.column_names();
  let mut lines: Vec<Line<'static>> = Vec::new();

  if let Some(metadata) = &result.metadata {
    if let Some(stats) = stats_line(metadata) {
      lines.push(stats);
    }
  }

  if result.rows.is_empty() {
    lines.push(Line::styled("query returned no rows", tablescope_theme::muted()));
    return Text::from(lines);
  }

  let visible = visible_indices(search, result.rows.len());
  if visible.len() != result.rows.len() {
    lines.push(filtered_line(visible.len(), result.rows.len()));
  }

  match view {
    ViewMode::Table => {
      let col_width = (width as usize / columns.len().max(1)).max(2);
      let header: String = columns.iter().map(|c| fit(c, col_width)).collect::<Vec<_>>().join(" ");
      lines.push(Line::styled(header, tablescope_theme::header()));
      lines.push(Line::styled("─".repeat(width as usize), tablescope_theme::border_normal()));
      for &i in &visible {
        let row = &result.rows[i];
        let mut spans: Vec<Span<'static>> = Vec::new();
        for (n, col) in columns.iter().enumerate() {
          let value = row.get(col).unwrap_or(&Value::Null);
          spans.push(Span::styled(fit(&value_string(value), col_width), value_style(value)));
          if n + 1 < columns.len() {
            spans.push(Span::raw(" "));
          }
        }
        lines.push(Line::from(spans).style(row_style(search, i)));
      }
    },
    ViewMode::List => {
      let key_width = columns.iter().map(|c| display_width(c)).max().unwrap_or(0);
      for &i in &visible {
        let row = &result.rows[i];
        for col in &columns {
          let value = row.get(col).unwrap_or(&Value::Null);
          let line = Line::from(vec![
            Span::styled(format!("{col:>key_width$}"), tablescope_theme::header()),
            Span::raw(": "),
            value_span(value),
          ]);
          lines.push(line.style(row_style(search, i)));
        }
        lines.push(Line::raw(""));
      }
    },
  }
  Text::from(lines)
}

fn render_schema(fields: &[SchemaField], view: ViewMode, width: u16, search: &SearchState) -> Text<'static> {
  let mut lines: Vec<Line<'static>> = Vec::new();
  let visible = visible_indices(search, fields.len());
  if visible.len() != fields.len() {
    lines.push(filtered_line(visible.len(), fields.len()));
  }
  match view {
    ViewMode::Table => {
      let col_width = (width as usize / 3).max(2);
      let header = [fit("name", col_width), fit("type", col_width), fit("required", col_width)].join(" ");
      lines.push(Line::styled(header, tablescope_theme::header()));
      lines.push(Line::styled("─".repeat(width as usize), tablescope_theme::border_normal()));
      for &i in &visible {
        let f = &fields[i];
        let text =
          [fit(&f.name, col_width), fit(&f.field_type, col_width), fit(&f.required.to_string(), col_width)].join(" ");
        lines.push(Line::raw(text).style(row_style(search, i)));
      }
    },
    ViewMode::List => {
      for &i in &visible {
        let f = &fields[i];
        let style = row_style(search, i);
        lines.push(
          Line::from(vec![
            Span::styled(f.name.clone(), tablescope_theme::header()),
            Span::raw(" "),
            Span::styled(f.field_type.clone(), tablescope_theme::value_nested()),
            Span::styled(if f.required { "  required" } else { "  optional" }.to_string(), tablescope_theme::muted()),
          ])
          .style(style),
        );
      }
    },
  }
  Text::from(lines)
}

fn render_headers(headers: &[(String, String)], search: &SearchState) -> Text<'static> {
  let mut lines: Vec<Line<'static>> = Vec::new();
  let visible = visible_indices(search, headers.len());
  if visible.len() != headers.len() {
    lines.push(filtered_line(visible.len(), headers.len()));
  }
  let key_width = headers.iter().map(|(k, _)| display_width(k)).max().unwrap_or(0);
  for &i in &visible {
    let (key, value) = &headers[i];
    lines.push(
      Line::from(vec![
        Span::styled(format!("{key:>key_width$}"), tablescope_theme::header()),
        Span::raw(": "),
        Span::styled(value.clone(), tablescope_theme::input()),
      ])
      .style(row_style(search, i)),
    );
  }
  Text::from(lines)
}

/// Metadata renders as an indented tree regardless of view mode; the shape is
/// inherently nested and a column grid would lose it.
fn render_metadata(value: &Value) -> Text<'static> {
  let mut lines: Vec<Line<'static>> = Vec::new();
  metadata_lines(value, 0, &mut lines);
  Text::from(lines)
}

fn metadata_lines(value: &Value, depth: usize, out: &mut Vec<Line<'static>>) {
  let indent = "  ".repeat(depth);
  match value {
    Value::Object(entries) => {
      for (key, child) in entries {
        match child {
          Value::Object(_) | Value::Array(_) => {
            out.push(Line::from(vec![
              Span::raw(indent.clone()),
              Span::styled(key.clone(), tablescope_theme::header()),
              Span::raw(":"),
            ]));
            metadata_lines(child, depth + 1, out);
          },
          scalar => {
            out.push(Line::from(vec![
              Span::raw(indent.clone()),
              Span::styled(key.clone(), tablescope_theme::header()),
              Span::raw(": "),
              value_span(scalar),
            ]));
          },
        }
      }
    },
    Value::Array(items) => {
      for item in items {
        match item {
          Value::Object(_) | Value::Array(_) => {
            out.push(Line::from(vec![Span::raw(indent.clone()), Span::styled("-", tablescope_theme::muted())]));
            metadata_lines(item, depth + 1, out);
          },
          scalar => {
            out.push(Line::from(vec![
              Span::raw(indent.clone()),
              Span::styled("- ", tablescope_theme::muted()),
              value_span(scalar),
            ]));
          },
        }
      }
    },
    scalar => out.push(Line::from(vec![Span::raw(indent), value_span(scalar)])),
  }
}

/// Dispatcher the results pane calls every frame. Always produces something
/// to read; a result missing the requested section explains itself instead of
/// going blank.
pub fn render_result(
  result: &QueryResult,
  view: ViewMode,
  display: DisplayMode,
  width: u16,
  search: &SearchState,
  metadata_filtered: Option<&Value>,
) -> Text<'static> {
  if let Some(error) = &result.error {
    return Text::from(Line::styled(format!("query error: {error}"), tablescope_theme::error()));
  }
  match display {
    DisplayMode::Data => render_data(result, view, width, search),
    DisplayMode::Schema => match &result.schema {
      Some(fields) if !fields.is_empty() => render_schema(fields, view, width, search),
      _ => Text::from(Line::styled("no schema reported for this result", tablescope_theme::muted())),
    },
    DisplayMode::Headers => match &result.headers {
      Some(headers) if !headers.is_empty() => render_headers(headers, search),
      _ => Text::from(Line::styled("no response headers captured", tablescope_theme::muted())),
    },
    DisplayMode::Metadata => {
      let searching = !search.term.trim().is_empty();
      match (metadata_filtered, &result.metadata) {
        (Some(filtered), _) if searching => render_metadata(filtered),
        (None, Some(_)) if searching => {
          Text::from(Line::styled("no metadata entries match", tablescope_theme::muted()))
        },
        (_, Some(metadata)) => render_metadata(metadata),
        (_, None) => Text::from(Line::styled("no metadata reported for this result", tablescope_theme::muted())),
      }
    },
  }
}
