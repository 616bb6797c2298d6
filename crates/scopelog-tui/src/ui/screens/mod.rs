mod log_viewer;

pub use log_viewer::{LogViewerScreen, record_line};
