use serde_json::Value;
use tracing::debug;

use scopelog_types::{FilterState, SeverityMask};

use crate::error::StorageError;
use crate::storage::StorageBackend;

/// Result of reading filter state from storage
#[derive(Debug)]
pub struct LoadedFilters {
    /// One entry per known namespace
    pub state: FilterState,

    /// Read or parse failure that forced a fallback to defaults
    pub error: Option<StorageError>,
}

/// Reads and writes the namespace -> mask map under one storage key
#[derive(Clone, Debug)]
pub struct FilterStore {
    key: String,
}

impl FilterStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load stored masks for `namespaces`, filling gaps with `default_mask`
    ///
    /// Entries for unknown namespaces or with masks outside ALL are dropped.
    /// A storage failure is returned alongside the default-filled state.
    pub fn load(
        &self,
        storage: &dyn StorageBackend,
        namespaces: &[String],
        default_mask: SeverityMask,
    ) -> LoadedFilters {
        let (mut state, error) = match self.read_stored(storage, namespaces) {
            Ok(state) => (state, None),
            Err(e) => (FilterState::new(), Some(e)),
        };

        for namespace in namespaces {
            if !state.contains(namespace) {
                state.set(namespace.clone(), default_mask);
            }
        }

        LoadedFilters { state, error }
    }

    /// Valid stored entries only, without defaults
    fn read_stored(
        &self,
        storage: &dyn StorageBackend,
        namespaces: &[String],
    ) -> Result<FilterState, StorageError> {
        let mut state = FilterState::new();

        let Some(raw) = storage.get_item(&self.key)? else {
            return Ok(state);
        };

        let value: Value = serde_json::from_str(&raw).map_err(|source| StorageError::Parse {
            key: self.key.clone(),
            source,
        })?;

        let entries = match value {
            Value::Object(entries) => entries,
            Value::Null => return Ok(state),
            _ => {
                return Err(StorageError::NotAnObject {
                    key: self.key.clone(),
                });
            }
        };

        for (namespace, raw_mask) in entries {
            match stored_mask(&raw_mask) {
                Some(mask) if namespaces.contains(&namespace) => state.set(namespace, mask),
                _ => debug!(%namespace, value = %raw_mask, "dropping stored filter entry"),
            }
        }

        Ok(state)
    }

    /// Write the whole map back, replacing whatever was stored
    pub fn persist(
        &self,
        storage: &mut dyn StorageBackend,
        state: &FilterState,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(state).map_err(StorageError::Serialize)?;
        storage.set_item(&self.key, &json)
    }
}

/// Mask from a stored JSON number; whole floats such as `3.0` count as integers
fn stored_mask(raw: &Value) -> Option<SeverityMask> {
    let bits = match raw.as_u64() {
        Some(bits) => u8::try_from(bits).ok()?,
        None => {
            let float = raw.as_f64()?;
            if float.fract() != 0.0 || !(0.0..=15.0).contains(&float) {
                return None;
            }
            float as u8
        }
    };
    SeverityMask::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn namespaces() -> Vec<String> {
        vec!["net".to_string(), "ui".to_string()]
    }

    #[test]
    fn test_empty_storage_uses_defaults() {
        let storage = MemoryStorage::new();
        let loaded = FilterStore::new("k").load(&storage, &namespaces(), SeverityMask::ERROR);

        assert!(loaded.error.is_none());
        assert_eq!(loaded.state.get("net"), Some(SeverityMask::ERROR));
        assert_eq!(loaded.state.get("ui"), Some(SeverityMask::ERROR));
    }

    #[test]
    fn test_out_of_range_mask_falls_back_to_default() {
        let storage = MemoryStorage::with_item("k", r#"{"net":99,"ui":6}"#);
        let loaded = FilterStore::new("k").load(&storage, &namespaces(), SeverityMask::ERROR);

        assert!(loaded.error.is_none());
        assert_eq!(loaded.state.get("net"), Some(SeverityMask::ERROR));
        assert_eq!(
            loaded.state.get("ui"),
            Some(SeverityMask::WARN | SeverityMask::INFO)
        );
    }

    #[test]
    fn test_unknown_namespaces_and_non_integers_dropped() {
        let storage =
            MemoryStorage::with_item("k", r#"{"gone":15,"net":"3","ui":1.5,"extra":null}"#);
        let loaded = FilterStore::new("k").load(&storage, &namespaces(), SeverityMask::DEBUG);

        assert_eq!(loaded.state.len(), 2);
        assert!(!loaded.state.contains("gone"));
        assert_eq!(loaded.state.get("net"), Some(SeverityMask::DEBUG));
        assert_eq!(loaded.state.get("ui"), Some(SeverityMask::DEBUG));
    }

    #[test]
    fn test_whole_float_masks_accepted() {
        let storage = MemoryStorage::with_item("k", r#"{"net":3.0,"ui":1e0}"#);
        let loaded = FilterStore::new("k").load(&storage, &namespaces(), SeverityMask::DEBUG);

        assert!(loaded.error.is_none());
        assert_eq!(loaded.state.get("net"), SeverityMask::from_bits(3));
        assert_eq!(loaded.state.get("ui"), Some(SeverityMask::ERROR));
    }

    #[test]
    fn test_fractional_or_large_float_masks_dropped() {
        let storage = MemoryStorage::with_item("k", r#"{"net":2.5,"ui":16.0}"#);
        let loaded = FilterStore::new("k").load(&storage, &namespaces(), SeverityMask::DEBUG);

        assert_eq!(loaded.state.get("net"), Some(SeverityMask::DEBUG));
        assert_eq!(loaded.state.get("ui"), Some(SeverityMask::DEBUG));
    }

    #[test]
    fn test_corrupted_json_reports_error_and_defaults() {
        let storage = MemoryStorage::with_item("k", "{not json");
        let loaded = FilterStore::new("k").load(&storage, &namespaces(), SeverityMask::ERROR);

        assert!(matches!(loaded.error, Some(StorageError::Parse { .. })));
        assert_eq!(loaded.state.get("net"), Some(SeverityMask::ERROR));
    }

    #[test]
    fn test_non_object_json_reports_error() {
        let storage = MemoryStorage::with_item("k", "[1,2]");
        let loaded = FilterStore::new("k").load(&storage, &namespaces(), SeverityMask::ERROR);
        assert!(matches!(loaded.error, Some(StorageError::NotAnObject { .. })));

        let storage = MemoryStorage::with_item("k", "null");
        let loaded = FilterStore::new("k").load(&storage, &namespaces(), SeverityMask::ERROR);
        assert!(loaded.error.is_none());
    }

    #[test]
    fn test_persist_then_load_reproduces_state() {
        let store = FilterStore::new("k");
        let mut storage = MemoryStorage::new();

        let mut state = FilterState::new();
        state.set("net", SeverityMask::ALL);
        state.set("ui", SeverityMask::NONE);
        store.persist(&mut storage, &state).unwrap();

        let loaded = store.load(&storage, &namespaces(), SeverityMask::ERROR);
        assert_eq!(loaded.state, state);
    }
}
