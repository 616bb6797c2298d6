mod filter_panel;
mod help_overlay;
mod status_bar;

pub use filter_panel::{FilterPanel, FilterPanelState, is_checked};
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, filter_panel_hints, log_viewer_hints};
