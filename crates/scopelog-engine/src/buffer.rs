use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use scopelog_types::Severity;

use crate::format::Decorated;

/// A decorated line as it reached a sink
#[derive(Clone, Debug, PartialEq)]
pub struct SinkRecord {
    /// Unique sequential ID
    pub id: u64,

    /// Sink write operation that received the line
    pub severity: Severity,

    pub line: Decorated,
}

/// Thread-safe ring buffer of emitted lines
#[derive(Clone)]
pub struct RecordBuffer {
    /// Internal storage
    entries: Arc<RwLock<VecDeque<SinkRecord>>>,

    /// Maximum capacity
    capacity: usize,

    /// Next record ID
    next_id: Arc<AtomicU64>,
}

impl RecordBuffer {
    /// Create a new buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Push a line, evicting the oldest if at capacity
    pub fn push(&self, severity: Severity, line: Decorated) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(SinkRecord { id, severity, line });
    }

    /// Get all records (cloned for rendering)
    pub fn all(&self) -> Vec<SinkRecord> {
        self.entries.read().iter().cloned().collect()
    }

    /// Get records in a range (for virtual scrolling)
    pub fn range(&self, start: usize, count: usize) -> Vec<SinkRecord> {
        let entries = self.entries.read();
        entries.iter().skip(start).take(count).cloned().collect()
    }

    /// Get record count per severity
    pub fn level_counts(&self) -> LevelCounts {
        let entries = self.entries.read();
        let mut counts = LevelCounts::default();

        for entry in entries.iter() {
            match entry.severity {
                Severity::Debug => counts.debug += 1,
                Severity::Info => counts.info += 1,
                Severity::Warn => counts.warn += 1,
                Severity::Error => counts.error += 1,
            }
        }

        counts
    }

    /// Total record count
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear all records
    pub fn clear(&self) {
        self.entries.write().clear();
        self.next_id.store(0, Ordering::SeqCst);
    }
}

/// Counts per severity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.debug + self.info + self.warn + self.error
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Debug => self.debug,
            Severity::Info => self.info,
            Severity::Warn => self.warn,
            Severity::Error => self.error,
        }
    }
}
