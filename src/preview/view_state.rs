//! Per-document preference persistence.
//!
//! All documents share one record stored under [`STORAGE_RECORD_LIVE_PREVIEW_FLAGS`],
//! shaped `{ documentId: { preferenceName: value } }`. An empty document id
//! means the session is ephemeral: reads return the caller's default and
//! writes go nowhere.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::data::AppStateStore;

use super::error::PreviewError;

/// Fixed key of the shared preference record
pub const STORAGE_RECORD_LIVE_PREVIEW_FLAGS: &str = "live_preview_flags";

/// Named preference values scoped by document id
pub trait ViewStateStore: Send + Sync {
    /// Raw stored value, `None` if absent or the id is empty
    fn get_value(&self, document_id: &str, name: &str) -> Option<Value>;

    /// Store a raw value. Does nothing for an empty id.
    fn set_value(&self, document_id: &str, name: &str, value: Value);
}

impl<'a> dyn ViewStateStore + 'a {
    /// Typed read; absent or mistyped values yield `default`
    pub fn get<T: DeserializeOwned>(&self, document_id: &str, name: &str, default: T) -> T {
        match self.get_value(document_id, name) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(document_id, name, error = %e, "Stored preference has wrong type");
                default
            }),
            None => default,
        }
    }

    pub fn set<T: Serialize>(&self, document_id: &str, name: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.set_value(document_id, name, value),
            Err(e) => tracing::warn!(document_id, name, error = %e, "Preference not serializable"),
        }
    }
}

/// String key-value storage the preference record lives in
pub trait KeyValueBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, PreviewError>;
    fn write(&self, key: &str, value: &str) -> Result<(), PreviewError>;
}

impl KeyValueBackend for AppStateStore {
    fn read(&self, key: &str) -> Result<Option<String>, PreviewError> {
        self.get(key).map_err(PreviewError::from)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PreviewError> {
        self.set(key, value).map_err(PreviewError::from)
    }
}

/// Process-local backend; also handy in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PreviewError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PreviewError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// [`ViewStateStore`] keeping the whole record as JSON in a [`KeyValueBackend`]
pub struct PreferenceRecordStore<B> {
    backend: B,
    // Serializes read-modify-write of the record
    write_lock: Mutex<()>,
}

impl<B: KeyValueBackend> PreferenceRecordStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whole record; unreadable or corrupt records read as empty
    pub fn load_record(&self) -> Map<String, Value> {
        let raw = match self.backend.read(STORAGE_RECORD_LIVE_PREVIEW_FLAGS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Map::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read preference record");
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(record)) => record,
            Ok(_) => {
                tracing::warn!("Preference record is not an object, ignoring");
                Map::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Preference record is corrupt, ignoring");
                Map::new()
            }
        }
    }

    fn store_record(&self, record: &Map<String, Value>) -> Result<(), PreviewError> {
        let raw = serde_json::to_string(record)?;
        self.backend.write(STORAGE_RECORD_LIVE_PREVIEW_FLAGS, &raw)
    }

    /// Merge one value into the document's flags and persist the record.
    ///
    /// Unlike [`ViewStateStore::set_value`] this reports backend failures.
    pub fn write_value(
        &self,
        document_id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), PreviewError> {
        if document_id.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        let mut record = self.load_record();
        let flags = record
            .entry(document_id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !flags.is_object() {
            *flags = Value::Object(Map::new());
        }
        if let Value::Object(flags) = flags {
            flags.insert(name.to_string(), value);
        }
        self.store_record(&record)
    }
}

impl<B: KeyValueBackend> ViewStateStore for PreferenceRecordStore<B> {
    fn get_value(&self, document_id: &str, name: &str) -> Option<Value> {
        if document_id.is_empty() {
            return None;
        }
        self.load_record()
            .get(document_id)
            .and_then(|flags| flags.get(name))
            .cloned()
    }

    fn set_value(&self, document_id: &str, name: &str, value: Value) {
        if let Err(e) = self.write_value(document_id, name, value) {
            tracing::warn!(document_id, name, error = %e, "Failed to persist preference");
        }
    }
}
