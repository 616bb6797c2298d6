//! TUI components for scopelog
//!
//! This crate provides the terminal filter panel and log viewer,
//! including state management, keybindings, event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, EventSender, Tui};
pub use ui::components::{
    FilterPanel, FilterPanelState, HelpOverlay, StatusBar, filter_panel_hints, is_checked,
    log_viewer_hints,
};
pub use ui::screens::{LogViewerScreen, record_line};
pub use ui::{Layout, Theme};
