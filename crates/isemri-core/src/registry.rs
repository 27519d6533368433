//! In-memory import registry.
//!
//! Each received document becomes an import record keyed by a random UUID
//! and walks a fixed lifecycle: queued, parsed, then committed or failed.
//! The registry is shared between threads and enforces the legal
//! transitions; an illegal one is ignored and logged, never applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::models::ExtractedDraft;

/// Lifecycle state of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    /// Received, not yet extracted.
    Queued,
    /// Extraction finished; a draft is attached awaiting review.
    Parsed,
    /// The reviewed draft was accepted.
    Committed,
    /// Extraction or review failed terminally.
    Failed,
}

/// One tracked import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: Uuid,
    pub state: ImportState,
    pub received_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<ExtractedDraft>,
    /// Truncated OCR text kept for review-time diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Thread-safe registry of import records.
#[derive(Debug, Default)]
pub struct ImportRegistry {
    inner: RwLock<HashMap<Uuid, ImportRecord>>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly received document and return its id.
    pub fn enqueue(&self) -> Uuid {
        let id = Uuid::new_v4();
        let record = ImportRecord {
            id,
            state: ImportState::Queued,
            received_at: Utc::now(),
            draft: None,
            raw_text: None,
            error: None,
        };
        self.write().insert(id, record);
        id
    }

    /// Attach an extracted draft and the diagnostic text behind it; legal
    /// only from `Queued`.
    pub fn store_parsed(&self, id: Uuid, draft: ExtractedDraft, raw_text: Option<String>) -> bool {
        self.transition(id, ImportState::Queued, |record| {
            record.state = ImportState::Parsed;
            record.draft = Some(draft);
            record.raw_text = raw_text;
        })
    }

    /// Accept a parsed draft; legal only from `Parsed`.
    pub fn mark_committed(&self, id: Uuid) -> bool {
        self.transition(id, ImportState::Parsed, |record| {
            record.state = ImportState::Committed;
        })
    }

    /// Terminal failure, legal from `Queued` or `Parsed`.
    pub fn mark_failed(&self, id: Uuid, error: impl Into<String>) -> bool {
        let mut map = self.write();
        let Some(record) = map.get_mut(&id) else {
            warn!("unknown import {}", id);
            return false;
        };
        if matches!(record.state, ImportState::Committed | ImportState::Failed) {
            warn!("import {} is already terminal", id);
            return false;
        }
        record.state = ImportState::Failed;
        record.error = Some(error.into());
        true
    }

    /// Snapshot of one record.
    pub fn get(&self, id: Uuid) -> Option<ImportRecord> {
        self.read().get(&id).cloned()
    }

    /// Snapshot of all records, newest first.
    pub fn list(&self) -> Vec<ImportRecord> {
        let mut records: Vec<ImportRecord> = self.read().values().cloned().collect();
        records.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        records
    }

    fn transition(&self, id: Uuid, expected: ImportState, apply: impl FnOnce(&mut ImportRecord)) -> bool {
        let mut map = self.write();
        let Some(record) = map.get_mut(&id) else {
            warn!("unknown import {}", id);
            return false;
        };
        if record.state != expected {
            warn!(
                "import {} is {:?}, expected {:?}",
                id, record.state, expected
            );
            return false;
        }
        apply(record);
        true
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, ImportRecord>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, ImportRecord>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft() -> ExtractedDraft {
        let mut draft = ExtractedDraft::empty(Utc::now());
        draft.ensure_items();
        draft
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let registry = ImportRegistry::new();
        let id = registry.enqueue();
        assert_eq!(registry.get(id).unwrap().state, ImportState::Queued);

        assert!(registry.store_parsed(id, draft(), Some("Plaka: 34 ABC 123".to_string())));
        let record = registry.get(id).unwrap();
        assert_eq!(record.state, ImportState::Parsed);
        assert!(record.draft.is_some());
        assert_eq!(record.raw_text.as_deref(), Some("Plaka: 34 ABC 123"));

        assert!(registry.mark_committed(id));
        assert_eq!(registry.get(id).unwrap().state, ImportState::Committed);
    }

    #[test]
    fn test_failure_from_queued() {
        let registry = ImportRegistry::new();
        let id = registry.enqueue();

        assert!(registry.mark_failed(id, "unreadable document"));
        let record = registry.get(id).unwrap();
        assert_eq!(record.state, ImportState::Failed);
        assert_eq!(record.error.as_deref(), Some("unreadable document"));
    }

    #[test]
    fn test_illegal_transitions_are_ignored() {
        let registry = ImportRegistry::new();
        let id = registry.enqueue();

        // Cannot commit before a draft exists.
        assert!(!registry.mark_committed(id));

        registry.store_parsed(id, draft(), None);
        registry.mark_committed(id);
        // Terminal states stay put.
        assert!(!registry.mark_failed(id, "too late"));
        assert!(!registry.store_parsed(id, draft(), None));
        assert_eq!(registry.get(id).unwrap().state, ImportState::Committed);
    }

    #[test]
    fn test_unknown_id() {
        let registry = ImportRegistry::new();
        assert!(!registry.mark_committed(Uuid::new_v4()));
        assert!(registry.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_list_is_newest_first() {
        let registry = ImportRegistry::new();
        let first = registry.enqueue();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = registry.enqueue();

        let listed = registry.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second);
        assert_eq!(listed[1].id, first);
    }
}
