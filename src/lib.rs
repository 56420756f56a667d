pub mod action;
pub mod app;
pub mod autocomplete;
pub mod catalog;
pub mod cli;
pub mod components;
pub mod config;
pub mod debounce;
pub mod history;
pub mod mode;
pub mod render;
pub mod search;
pub mod sidebar;
pub mod tui;
pub mod utils;
