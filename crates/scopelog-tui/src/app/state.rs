use scopelog_types::Notification;

use crate::ui::components::FilterPanelState;

/// UI-specific transient state
pub struct UiState {
    /// Is help overlay visible?
    pub help_visible: bool,

    /// Scroll position in log viewer
    pub log_scroll: usize,

    /// Auto-scroll enabled (follow mode)?
    pub auto_scroll: bool,

    /// Set whenever something on screen may have changed
    pub render_dirty: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            help_visible: false,
            log_scroll: 0,
            auto_scroll: true,
            render_dirty: true,
        }
    }
}

/// Global application state
#[derive(Default)]
pub struct AppState {
    /// UI state
    pub ui_state: UiState,

    /// Filter panel cursor and visibility
    pub panel: FilterPanelState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to an engine notification
    pub fn handle_notification(&mut self, kind: Notification) {
        match kind {
            Notification::ShowPanel => self.panel.show(),
            Notification::HidePanel => self.panel.hide(),
            Notification::FilterStateChanged => {}
        }
        self.ui_state.render_dirty = true;
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = self.ui_state.log_scroll.saturating_sub(n);
    }

    /// Not capped here; the log viewer clamps to the record count
    pub fn scroll_down(&mut self, n: usize) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = self.ui_state.log_scroll.saturating_add(n);
    }

    pub fn scroll_to_top(&mut self) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.ui_state.auto_scroll = true;
        self.ui_state.log_scroll = usize::MAX;
    }

    /// Reset scrolling after the record buffer was cleared
    pub fn reset_scroll(&mut self) {
        self.ui_state.log_scroll = 0;
        self.ui_state.auto_scroll = true;
    }
}
