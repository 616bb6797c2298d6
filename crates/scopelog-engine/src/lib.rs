//! Namespaced console logging for scopelog
//!
//! This crate provides the filter store, the log engine with its toggle
//! operations, line decoration, and the sinks decorated lines are written to.

mod buffer;
mod clock;
mod config;
mod engine;
mod error;
mod format;
mod notify;
mod palette;
mod selection;
mod sink;
mod storage;
mod store;

pub use buffer::{LevelCounts, RecordBuffer, SinkRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ConfigError, EngineConfig, colors_supported, colors_supported_for, load_config,
    load_config_from_path,
};
pub use engine::{LogEngine, LogEngineBuilder};
pub use error::StorageError;
pub use format::{Decorated, FormatParam, Segment, SegmentStyle, StyledRecord, format_elapsed};
pub use notify::{Notifier, SubscriptionId};
pub use palette::{assign_colors, namespace_color};
pub use selection::SelectionCounts;
pub use sink::{BufferSink, ConsoleSink, OutputSink};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{FilterStore, LoadedFilters};

// Re-export types used in our public API
pub use scopelog_types::{
    FilterState, Notification, Rgb, Severity, SeverityMask, SeveritySelector, Target,
};
