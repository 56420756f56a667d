//! Shared style palette for the tablescope TUI.
//!
//! Every widget pulls its colors from here so the whole client can be
//! re-skinned by editing one file.

use once_cell::sync::Lazy;
use ratatui::style::{Color, Modifier, Style};

pub struct Palette {
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub dim: Color,
  pub border: Color,
  pub border_active: Color,
  pub error: Color,
  pub warning: Color,
  pub info: Color,
  pub selection_bg: Color,
}

static PALETTE: Lazy<Palette> = Lazy::new(|| Palette {
  bg: Color::Reset,
  fg: Color::Gray,
  accent: Color::Cyan,
  dim: Color::DarkGray,
  border: Color::DarkGray,
  border_active: Color::Cyan,
  error: Color::Red,
  warning: Color::Yellow,
  info: Color::Blue,
  selection_bg: Color::Rgb(45, 55, 72),
});

pub fn bg_primary() -> Style {
  Style::default().bg(PALETTE.bg).fg(PALETTE.fg)
}

pub fn title() -> Style {
  Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD)
}

pub fn border_normal() -> Style {
  Style::default().fg(PALETTE.border)
}

pub fn border_focused() -> Style {
  Style::default().fg(PALETTE.border_active)
}

pub fn header() -> Style {
  Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD)
}

pub fn selection_active() -> Style {
  Style::default().bg(PALETTE.selection_bg).add_modifier(Modifier::BOLD)
}

pub fn tab_normal() -> Style {
  Style::default().fg(PALETTE.dim)
}

pub fn tab_selected() -> Style {
  Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn input() -> Style {
  Style::default().fg(PALETTE.fg)
}

pub fn muted() -> Style {
  Style::default().fg(PALETTE.dim)
}

pub fn error() -> Style {
  Style::default().fg(PALETTE.error).add_modifier(Modifier::BOLD)
}

pub fn warning() -> Style {
  Style::default().fg(PALETTE.warning)
}

pub fn info() -> Style {
  Style::default().fg(PALETTE.info)
}

pub fn cursor_normal() -> Style {
  Style::default().add_modifier(Modifier::REVERSED)
}

pub fn cursor_insert() -> Style {
  Style::default().fg(Color::Black).bg(PALETTE.accent)
}

pub fn cursor_visual() -> Style {
  Style::default().fg(Color::Black).bg(PALETTE.warning)
}

// Value-type styles used by the result renderer. Each JSON value class gets
// one consistent style in every layout.

pub fn value_null() -> Style {
  Style::default().fg(PALETTE.dim).add_modifier(Modifier::ITALIC)
}

pub fn value_number() -> Style {
  Style::default().fg(Color::Magenta)
}

pub fn value_bool() -> Style {
  Style::default().fg(Color::Yellow)
}

pub fn value_timestamp() -> Style {
  Style::default().fg(Color::Green)
}

pub fn value_string() -> Style {
  Style::default().fg(PALETTE.fg)
}

pub fn value_nested() -> Style {
  Style::default().fg(Color::Blue)
}
