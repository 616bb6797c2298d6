use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use scopelog_types::{
    FilterState, Notification, Rgb, Severity, SeverityMask, SeveritySelector, Target,
};

use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, colors_supported};
use crate::format::{Decorated, decorate_plain, decorate_styled, format_elapsed};
use crate::notify::{Notifier, SubscriptionId};
use crate::palette::assign_colors;
use crate::selection::SelectionCounts;
use crate::sink::{ConsoleSink, OutputSink};
use crate::storage::{MemoryStorage, StorageBackend};
use crate::store::FilterStore;

type ReadyHook = Box<dyn FnOnce(&mut LogEngine)>;

/// Builder for [`LogEngine`]
pub struct LogEngineBuilder {
    config: EngineConfig,
    sink: Option<Box<dyn OutputSink>>,
    storage: Option<Box<dyn StorageBackend>>,
    clock: Option<Box<dyn Clock>>,
    color_support: Option<bool>,
    ready_hooks: Vec<ReadyHook>,
}

impl LogEngineBuilder {
    /// Where decorated lines go; defaults to stderr
    pub fn sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Where the filter map is persisted; defaults to in-memory storage
    pub fn storage(mut self, storage: impl StorageBackend + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Override environment colour detection
    pub fn color_support(mut self, supported: bool) -> Self {
        self.color_support = Some(supported);
        self
    }

    /// Run once initialisation is complete, e.g. to mount a filter panel
    pub fn on_ready(mut self, hook: impl FnOnce(&mut LogEngine) + 'static) -> Self {
        self.ready_hooks.push(Box::new(hook));
        self
    }

    pub fn build(self) -> LogEngine {
        let namespaces = self.config.unique_namespaces();
        if namespaces.len() != self.config.namespaces.len() {
            warn!("duplicate namespaces in configuration were ignored");
        }

        let color_support = self.color_support.unwrap_or_else(colors_supported);
        let mut engine = LogEngine {
            store: FilterStore::new(self.config.storage_key.clone()),
            colors_enabled: !self.config.disable_colors && color_support,
            default_severity: self.config.default_severity,
            namespaces,
            sink: self.sink.unwrap_or_else(|| Box::new(ConsoleSink::stderr())),
            storage: self
                .storage
                .unwrap_or_else(|| Box::new(MemoryStorage::new())),
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            filters: FilterState::new(),
            selection: SelectionCounts::default(),
            colors: HashMap::new(),
            times: HashMap::new(),
            notifier: Notifier::new(),
        };
        engine.init();

        for hook in self.ready_hooks {
            hook(&mut engine);
        }
        engine
    }
}

/// Namespaced, severity-filtered logger
///
/// Owns the per-namespace filter masks, persists them after every change and
/// decorates enabled calls before handing them to the output sink.
pub struct LogEngine {
    namespaces: Vec<String>,
    default_severity: SeverityMask,
    store: FilterStore,
    storage: Box<dyn StorageBackend>,
    sink: Box<dyn OutputSink>,
    clock: Box<dyn Clock>,
    filters: FilterState,
    selection: SelectionCounts,
    colors: HashMap<String, Rgb>,
    times: HashMap<(String, Severity), DateTime<Utc>>,
    colors_enabled: bool,
    notifier: Notifier,
}

impl LogEngine {
    pub fn builder(config: EngineConfig) -> LogEngineBuilder {
        LogEngineBuilder {
            config,
            sink: None,
            storage: None,
            clock: None,
            color_support: None,
            ready_hooks: Vec::new(),
        }
    }

    fn init(&mut self) {
        let loaded = self
            .store
            .load(self.storage.as_ref(), &self.namespaces, self.default_severity);
        if let Some(e) = loaded.error {
            warn!(key = self.store.key(), error = %e, "falling back to default filters");
            self.sink
                .error(Decorated::Plain(vec![Value::String(e.to_string())]));
        }
        self.filters = loaded.state;
        self.colors = assign_colors(&self.namespaces);
        self.selection = SelectionCounts::recompute(&self.filters);

        debug!(
            namespaces = self.namespaces.len(),
            colors = self.colors_enabled,
            "log engine initialised"
        );
    }

    // ------------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------------

    /// Emit `args` under `namespace` if its mask has `severity` enabled
    pub fn log<I>(&mut self, severity: Severity, namespace: &str, args: I)
    where
        I: IntoIterator<Item = Value>,
    {
        if !self.is_enabled(namespace, severity) {
            return;
        }
        let line = self.decorate(namespace, args.into_iter().collect(), severity);
        self.sink.write(severity, line);
    }

    pub fn error<I: IntoIterator<Item = Value>>(&mut self, namespace: &str, args: I) {
        self.log(Severity::Error, namespace, args);
    }

    pub fn warn<I: IntoIterator<Item = Value>>(&mut self, namespace: &str, args: I) {
        self.log(Severity::Warn, namespace, args);
    }

    pub fn info<I: IntoIterator<Item = Value>>(&mut self, namespace: &str, args: I) {
        self.log(Severity::Info, namespace, args);
    }

    pub fn debug<I: IntoIterator<Item = Value>>(&mut self, namespace: &str, args: I) {
        self.log(Severity::Debug, namespace, args);
    }

    /// Whether a call at `severity` for `namespace` would reach the sink
    pub fn is_enabled(&self, namespace: &str, severity: Severity) -> bool {
        self.filters.mask(namespace).contains(severity)
    }

    fn decorate(&mut self, namespace: &str, args: Vec<Value>, severity: Severity) -> Decorated {
        let now = self.clock.now();
        let key = (namespace.to_string(), severity);
        let elapsed_ms = self
            .times
            .get(&key)
            .map(|prev| (now - *prev).num_milliseconds().max(0))
            .unwrap_or(0);
        self.times.insert(key, now);
        let elapsed = format_elapsed(elapsed_ms);

        if !self.colors_enabled {
            return Decorated::Plain(decorate_plain(namespace, args, &elapsed));
        }

        let color = self
            .colors
            .get(namespace)
            .copied()
            .unwrap_or(Rgb::new(0, 0, 0));
        Decorated::Styled(decorate_styled(namespace, color, severity, args, &elapsed))
    }

    // ------------------------------------------------------------------------
    // Filter mutation
    // ------------------------------------------------------------------------

    /// Flip filters for one cell, one row, one column or everything
    ///
    /// Rows, columns and the global toggle switch between fully on and fully off
    /// based on whether the selection is currently complete. A single cell is
    /// assigned when the namespace has no levels, otherwise XOR-toggled.
    /// Unknown namespaces are ignored.
    pub fn toggle_value(&mut self, target: Target, selector: SeveritySelector) {
        let total = self.namespaces.len();

        match (target, selector) {
            (Target::AllNamespaces, SeveritySelector::All) => {
                let next = if self.selection.is_all_selected(total) {
                    SeverityMask::NONE
                } else {
                    SeverityMask::ALL
                };
                for mask in self.filters.masks_mut() {
                    *mask = next;
                }
            }
            (Target::AllNamespaces, SeveritySelector::Level(level)) => {
                let clear = self.selection.is_level_selected(level, total);
                for mask in self.filters.masks_mut() {
                    *mask = if clear {
                        mask.without(level)
                    } else {
                        mask.with(level)
                    };
                }
            }
            (Target::Namespace(namespace), selector) => {
                let Some(current) = self.filters.get(&namespace) else {
                    debug!(%namespace, "toggle for unknown namespace ignored");
                    return;
                };
                let next = match selector {
                    SeveritySelector::All if current.is_all() => SeverityMask::NONE,
                    SeveritySelector::All => SeverityMask::ALL,
                    SeveritySelector::Level(level) if current.is_none() => level.into(),
                    SeveritySelector::Level(level) => current.toggled(level),
                };
                self.filters.set(namespace, next);
            }
        }

        if let Err(e) = self.store.persist(self.storage.as_mut(), &self.filters) {
            warn!(key = self.store.key(), error = %e, "failed to persist filters");
        }
        self.selection = SelectionCounts::recompute(&self.filters);
        self.notifier.emit(Notification::FilterStateChanged);
    }

    // ------------------------------------------------------------------------
    // Panel visibility
    // ------------------------------------------------------------------------

    pub fn show_filter_panel(&mut self) {
        self.notifier.emit(Notification::ShowPanel);
    }

    pub fn hide_filter_panel(&mut self) {
        self.notifier.emit(Notification::HidePanel);
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    pub fn subscribe<F>(&mut self, kind: Notification, callback: F) -> SubscriptionId
    where
        F: FnMut() + 'static,
    {
        self.notifier.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// The four concrete levels in display order
    pub fn severity_levels(&self) -> [Severity; 4] {
        Severity::ALL_LEVELS
    }

    pub fn current_filter_state(&self) -> &FilterState {
        &self.filters
    }

    pub fn selection_counts(&self) -> &SelectionCounts {
        &self.selection
    }

    pub fn namespace_color(&self, namespace: &str) -> Option<Rgb> {
        self.colors.get(namespace).copied()
    }

    pub fn colors_enabled(&self) -> bool {
        self.colors_enabled
    }

    pub fn storage_key(&self) -> &str {
        self.store.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StorageError;
    use crate::format::FormatParam;
    use crate::sink::BufferSink;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Harness {
        engine: LogEngine,
        sink: BufferSink,
        storage: MemoryStorage,
        clock: ManualClock,
    }

    fn harness(namespaces: &[&str], default: SeverityMask, stored: Option<&str>) -> Harness {
        let sink = BufferSink::new(64);
        let storage = match stored {
            Some(raw) => MemoryStorage::with_item("test-key", raw),
            None => MemoryStorage::new(),
        };
        let clock = ManualClock::default();
        let config = EngineConfig::new(namespaces.iter().copied())
            .with_storage_key("test-key")
            .with_default_severity(default)
            .with_colors_disabled(true);
        let engine = LogEngine::builder(config)
            .sink(sink.clone())
            .storage(storage.clone())
            .clock(clock.clone())
            .build();
        Harness {
            engine,
            sink,
            storage,
            clock,
        }
    }

    fn mask(bits: u8) -> SeverityMask {
        SeverityMask::from_bits(bits).unwrap()
    }

    #[test]
    fn test_initial_state_uses_default() {
        let h = harness(&["net", "ui"], SeverityMask::ERROR, None);
        let state = h.engine.current_filter_state();
        assert_eq!(state.get("net"), Some(mask(1)));
        assert_eq!(state.get("ui"), Some(mask(1)));
        assert_eq!(h.engine.selection_counts().count(Severity::Error), 2);
    }

    #[test]
    fn test_cell_toggle_enables_warn_for_one_namespace() {
        let mut h = harness(&["net", "ui"], SeverityMask::ERROR, None);
        h.engine
            .toggle_value(Target::namespace("net"), Severity::Warn.into());

        assert_eq!(h.engine.current_filter_state().get("net"), Some(mask(3)));
        assert_eq!(h.engine.current_filter_state().get("ui"), Some(mask(1)));

        h.engine.warn("net", [json!("x")]);
        h.engine.warn("ui", [json!("x")]);
        let records = h.sink.buffer().all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Warn);
        assert_eq!(
            records[0].line,
            Decorated::Plain(vec![json!("net"), json!("x"), json!("+0ms")])
        );
    }

    #[test]
    fn test_cell_toggle_is_self_inverse() {
        let mut h = harness(&["net"], mask(5), None);
        for level in Severity::ALL_LEVELS {
            h.engine.toggle_value(Target::namespace("net"), level.into());
            h.engine.toggle_value(Target::namespace("net"), level.into());
            assert_eq!(h.engine.current_filter_state().get("net"), Some(mask(5)));
        }
    }

    #[test]
    fn test_cell_toggle_on_empty_mask_assigns_flag() {
        let mut h = harness(&["net"], SeverityMask::NONE, None);
        h.engine
            .toggle_value(Target::namespace("net"), Severity::Debug.into());
        assert_eq!(
            h.engine.current_filter_state().get("net"),
            Some(SeverityMask::DEBUG)
        );
    }

    #[test]
    fn test_row_toggle_twice_restores_full_or_empty_row() {
        let mut h = harness(&["net"], SeverityMask::ALL, None);
        h.engine
            .toggle_value(Target::namespace("net"), SeveritySelector::All);
        assert_eq!(
            h.engine.current_filter_state().get("net"),
            Some(SeverityMask::NONE)
        );
        h.engine
            .toggle_value(Target::namespace("net"), SeveritySelector::All);
        assert_eq!(
            h.engine.current_filter_state().get("net"),
            Some(SeverityMask::ALL)
        );
    }

    #[test]
    fn test_row_toggle_on_partial_mask_selects_all() {
        let mut h = harness(&["net"], mask(3), None);
        h.engine
            .toggle_value(Target::namespace("net"), SeveritySelector::All);
        assert_eq!(
            h.engine.current_filter_state().get("net"),
            Some(SeverityMask::ALL)
        );
    }

    #[test]
    fn test_column_toggle_has_no_partial_state() {
        let mut h = harness(&["a", "b", "c"], SeverityMask::NONE, None);
        h.engine
            .toggle_value(Target::namespace("a"), Severity::Info.into());
        h.engine
            .toggle_value(Target::namespace("b"), Severity::Error.into());

        h.engine
            .toggle_value(Target::AllNamespaces, Severity::Info.into());
        let state = h.engine.current_filter_state();
        assert!(state.iter().all(|(_, m)| m.contains(Severity::Info)));
        // other flags preserved
        assert!(state.mask("b").contains(Severity::Error));

        h.engine
            .toggle_value(Target::AllNamespaces, Severity::Info.into());
        let state = h.engine.current_filter_state();
        assert!(state.iter().all(|(_, m)| !m.contains(Severity::Info)));
        assert!(state.mask("b").contains(Severity::Error));
    }

    #[test]
    fn test_global_toggle_selects_then_clears_everything() {
        let mut h = harness(&["net", "ui"], SeverityMask::ERROR, None);
        h.engine
            .toggle_value(Target::AllNamespaces, SeveritySelector::All);

        let state = h.engine.current_filter_state();
        assert!(state.iter().all(|(_, m)| m == SeverityMask::ALL));
        assert_eq!(h.engine.selection_counts().all_count(), 2);

        h.engine
            .toggle_value(Target::AllNamespaces, SeveritySelector::All);
        let state = h.engine.current_filter_state();
        assert!(state.iter().all(|(_, m)| m == SeverityMask::NONE));
        assert_eq!(h.engine.selection_counts().all_count(), 0);
    }

    #[test]
    fn test_toggle_persists_full_state() {
        let mut h = harness(&["net", "ui"], SeverityMask::ERROR, None);
        h.engine
            .toggle_value(Target::namespace("net"), Severity::Warn.into());
        assert_eq!(
            h.storage.item("test-key").as_deref(),
            Some(r#"{"net":3,"ui":1}"#)
        );
    }

    #[test]
    fn test_persisted_state_is_restored() {
        let h = harness(&["net", "ui"], SeverityMask::ERROR, Some(r#"{"net":12}"#));
        assert_eq!(h.engine.current_filter_state().get("net"), Some(mask(12)));
        assert_eq!(h.engine.current_filter_state().get("ui"), Some(mask(1)));
    }

    #[test]
    fn test_corrupted_storage_is_reported_to_sink() {
        let h = harness(&["net"], SeverityMask::WARN, Some("{broken"));
        let records = h.sink.buffer().all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Error);
        assert_eq!(
            h.engine.current_filter_state().get("net"),
            Some(SeverityMask::WARN)
        );
    }

    /// Backend whose reads and writes always fail
    struct UnavailableStorage;

    impl UnavailableStorage {
        fn io_error() -> StorageError {
            StorageError::Io {
                path: "unavailable".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            }
        }
    }

    impl StorageBackend for UnavailableStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(Self::io_error())
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(Self::io_error())
        }
    }

    #[test]
    fn test_unavailable_storage_keeps_engine_working() {
        let sink = BufferSink::new(16);
        let config = EngineConfig::new(["net"])
            .with_default_severity(SeverityMask::ERROR)
            .with_colors_disabled(true);
        let mut engine = LogEngine::builder(config)
            .sink(sink.clone())
            .storage(UnavailableStorage)
            .build();

        // read failure reported once, defaults used
        let records = sink.buffer().all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Error);
        assert_eq!(
            engine.current_filter_state().get("net"),
            Some(SeverityMask::ERROR)
        );

        let events = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&events);
        engine.subscribe(Notification::FilterStateChanged, move || {
            *counter.borrow_mut() += 1
        });

        // write failure keeps the mutation and still notifies
        engine.toggle_value(Target::namespace("net"), SeveritySelector::All);
        assert_eq!(engine.current_filter_state().get("net"), Some(SeverityMask::ALL));
        assert_eq!(engine.selection_counts().all_count(), 1);
        assert_eq!(*events.borrow(), 1);
        assert_eq!(sink.buffer().len(), 1);
    }

    #[test]
    fn test_unknown_namespace_toggle_is_noop() {
        let mut h = harness(&["net"], SeverityMask::ERROR, None);
        let events = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&events);
        h.engine
            .subscribe(Notification::FilterStateChanged, move || {
                *counter.borrow_mut() += 1
            });

        h.engine
            .toggle_value(Target::namespace("ghost"), Severity::Info.into());
        assert!(!h.engine.current_filter_state().contains("ghost"));
        assert_eq!(h.storage.item("test-key"), None);
        assert_eq!(*events.borrow(), 0);
    }

    #[test]
    fn test_disabled_call_has_no_side_effects() {
        let mut h = harness(&["net"], SeverityMask::ERROR, None);
        h.engine.debug("net", [json!("hidden")]);
        h.engine.info("unknown", [json!("hidden")]);
        assert!(h.sink.buffer().is_empty());
        assert!(h.engine.times.is_empty());
    }

    #[test]
    fn test_elapsed_tracked_per_namespace_and_severity() {
        let mut h = harness(&["net"], SeverityMask::ALL, None);
        h.engine.error("net", [json!("a")]);
        h.clock.advance(chrono::Duration::milliseconds(120));
        h.engine.error("net", [json!("b")]);
        h.engine.warn("net", [json!("c")]);
        h.clock.advance(chrono::Duration::seconds(3));
        h.engine.error("net", [json!("d")]);

        let elapsed: Vec<String> = h
            .sink
            .buffer()
            .all()
            .into_iter()
            .map(|r| match r.line {
                Decorated::Plain(values) => values.last().unwrap().as_str().unwrap().to_string(),
                Decorated::Styled(_) => unreachable!(),
            })
            .collect();
        assert_eq!(elapsed, vec!["+0ms", "+120ms", "+0ms", "+3s"]);
    }

    #[test]
    fn test_styled_decoration_uses_namespace_color() {
        let sink = BufferSink::new(8);
        let config = EngineConfig::new(["net", "ui"]).with_default_severity(SeverityMask::ALL);
        let mut engine = LogEngine::builder(config)
            .sink(sink.clone())
            .clock(ManualClock::default())
            .color_support(true)
            .build();
        assert!(engine.colors_enabled());

        engine.info("ui", [json!("hello"), json!({"k": 1})]);
        let records = sink.buffer().all();
        let Decorated::Styled(record) = &records[0].line else {
            panic!("expected styled line");
        };
        assert_eq!(record.template, "%c%s %c%s %O  %c%s");
        let expected = engine.namespace_color("ui").unwrap();
        match &record.params[0] {
            FormatParam::Style(style) => {
                assert!(style.bold);
                assert_eq!(style.color, expected);
            }
            other => panic!("unexpected param {other:?}"),
        }
    }

    #[test]
    fn test_disable_colors_wins_over_support() {
        let config = EngineConfig::new(["net"]).with_colors_disabled(true);
        let engine = LogEngine::builder(config).color_support(true).build();
        assert!(!engine.colors_enabled());
    }

    #[test]
    fn test_notifications_and_ready_hook() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let hook_seen = Rc::clone(&seen);
        let mut engine = LogEngine::builder(EngineConfig::new(["net"]))
            .sink(BufferSink::new(4))
            .on_ready(move |engine| {
                for kind in [
                    Notification::FilterStateChanged,
                    Notification::ShowPanel,
                    Notification::HidePanel,
                ] {
                    let seen = Rc::clone(&hook_seen);
                    engine.subscribe(kind, move || seen.borrow_mut().push(kind));
                }
            })
            .build();

        engine.show_filter_panel();
        engine.toggle_value(Target::namespace("net"), SeveritySelector::All);
        engine.hide_filter_panel();

        assert_eq!(
            *seen.borrow(),
            vec![
                Notification::ShowPanel,
                Notification::FilterStateChanged,
                Notification::HidePanel
            ]
        );
    }

    #[test]
    fn test_state_committed_before_subscribers_run() {
        let mut h = harness(&["net"], SeverityMask::ERROR, None);
        h.engine
            .subscribe(Notification::FilterStateChanged, || panic!("bad subscriber"));
        h.engine
            .toggle_value(Target::namespace("net"), SeveritySelector::All);
        assert_eq!(
            h.engine.current_filter_state().get("net"),
            Some(SeverityMask::ALL)
        );
        assert_eq!(h.storage.item("test-key").as_deref(), Some(r#"{"net":15}"#));
    }

    #[test]
    fn test_accessors() {
        let h = harness(&["net", "ui", "net"], SeverityMask::ERROR, None);
        assert_eq!(h.engine.namespaces(), ["net", "ui"]);
        assert_eq!(
            h.engine.severity_levels(),
            [Severity::Debug, Severity::Info, Severity::Warn, Severity::Error]
        );
        assert_eq!(h.engine.storage_key(), "test-key");
        assert!(h.engine.namespace_color("net").is_some());
        assert!(h.engine.namespace_color("ghost").is_none());
    }
}
