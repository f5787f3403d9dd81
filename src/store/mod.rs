//! Append-only operation logs over a key-value collaborator.
//!
//! Each log category lives under a fixed key as a JSON array of entries.
//! The store itself is a trait so hosts can plug in whatever persistence
//! they have (and tests a [`MemoryStore`]); the log book is an explicitly
//! passed context object, not ambient global state.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal key-value persistence boundary.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

/// Log categories, each with a fixed storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogCategory {
    /// Registry lookups (CNPJ, GTIN, NCM).
    Lookup,
    /// File downloads.
    Download,
    /// XML validation attempts.
    Validation,
}

impl LogCategory {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Lookup => "lookup.log",
            Self::Download => "download.log",
            Self::Validation => "validation.log",
        }
    }
}

/// One structured log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    /// What the operation was about (a CNPJ, a file name, …).
    pub subject: String,
    pub success: bool,
    pub error: Option<String>,
}

impl LogEntry {
    pub fn success(subject: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            subject: subject.into(),
            success: true,
            error: None,
        }
    }

    pub fn failure(subject: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            subject: subject.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Read/append/clear view over the per-category logs.
pub struct LogBook<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> LogBook<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// All entries of a category. A missing or corrupt payload reads as
    /// empty — the log is best-effort, it never fails the caller.
    pub fn read(&self, category: LogCategory) -> Vec<LogEntry> {
        self.store
            .get(category.key())
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Append one entry to a category.
    pub fn append(&self, category: LogCategory, entry: LogEntry) {
        let mut entries = self.read(category);
        entries.push(entry);
        if let Ok(raw) = serde_json::to_string(&entries) {
            self.store.set(category.key(), &raw);
        }
    }

    /// Drop every entry of a category.
    pub fn clear(&self, category: LogCategory) {
        self.store.remove(category.key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_read_clear_round_trip() {
        let store = MemoryStore::new();
        let book = LogBook::new(&store);

        assert!(book.read(LogCategory::Lookup).is_empty());
        book.append(LogCategory::Lookup, LogEntry::success("11222333000181"));
        book.append(
            LogCategory::Lookup,
            LogEntry::failure("00000000000000", "not found (404)"),
        );

        let entries = book.read(LogCategory::Lookup);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].success);
        assert_eq!(entries[1].error.as_deref(), Some("not found (404)"));

        // Categories are independent.
        assert!(book.read(LogCategory::Download).is_empty());

        book.clear(LogCategory::Lookup);
        assert!(book.read(LogCategory::Lookup).is_empty());
    }

    #[test]
    fn corrupt_payload_reads_as_empty() {
        let store = MemoryStore::new();
        store.set(LogCategory::Validation.key(), "{not json");
        let book = LogBook::new(&store);
        assert!(book.read(LogCategory::Validation).is_empty());
    }
}
