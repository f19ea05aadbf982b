//! In-memory knowledge store for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::traits::{KnowledgeKind, KnowledgeStore};
use crate::types::DetectionResult;

/// A persisted knowledge record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: Uuid,
    pub kind: KnowledgeKind,
    pub url: Option<String>,
    /// SHA-256 of the serialized payload
    pub content_hash: String,
    pub data: DetectionResult,
    pub saved_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    pub fn new(kind: KnowledgeKind, data: &DetectionResult) -> KnowledgeResult<Self> {
        Ok(Self {
            id: Uuid::now_v7(),
            kind,
            url: data.url.clone(),
            content_hash: calculate_hash(data)?,
            data: data.clone(),
            saved_at: Utc::now(),
        })
    }
}

/// Hash the parts of a detection that identify its content.
///
/// The timestamp is left out so re-detecting unchanged content hashes equal.
pub fn calculate_hash(data: &DetectionResult) -> KnowledgeResult<String> {
    let mut value = serde_json::to_value(data)?;
    if let Some(object) = value.as_object_mut() {
        object.remove("timestamp");
    }

    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&value)?);
    Ok(hex::encode(hasher.finalize()))
}

/// In-memory knowledge base.
///
/// Entries are lost on restart. URLs seeded with [`MemoryKnowledgeStore::with_known_urls`]
/// count as existing without having an entry.
#[derive(Default)]
pub struct MemoryKnowledgeStore {
    entries: RwLock<Vec<KnowledgeEntry>>,
    by_url: RwLock<HashMap<String, usize>>,
    known_urls: RwLock<HashSet<String>>,
}

impl MemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed URLs that should be reported as already known.
    pub fn with_known_urls(self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        if let Ok(mut known) = self.known_urls.write() {
            known.extend(urls.into_iter().map(Into::into));
        }
        self
    }

    /// Number of stored entries.
    pub fn entry_count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Snapshot of every stored entry, in insertion order.
    pub fn entries(&self) -> Vec<KnowledgeEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Stored entry for a URL.
    pub fn get(&self, url: &str) -> Option<KnowledgeEntry> {
        let entries = self.entries.read().ok()?;
        let by_url = self.by_url.read().ok()?;
        by_url.get(url).and_then(|&i| entries.get(i).cloned())
    }

    fn read<T>(lock: &RwLock<T>) -> KnowledgeResult<RwLockReadGuard<'_, T>> {
        lock.read().map_err(|_| KnowledgeError::Unavailable {
            reason: "memory store lock poisoned".into(),
        })
    }

    fn write<T>(lock: &RwLock<T>) -> KnowledgeResult<RwLockWriteGuard<'_, T>> {
        lock.write().map_err(|_| KnowledgeError::Unavailable {
            reason: "memory store lock poisoned".into(),
        })
    }
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    async fn exists(&self, url: &str) -> KnowledgeResult<bool> {
        if Self::read(&self.known_urls)?.contains(url) {
            return Ok(true);
        }
        Ok(Self::read(&self.by_url)?.contains_key(url))
    }

    async fn save(&self, kind: KnowledgeKind, data: &DetectionResult) -> KnowledgeResult<()> {
        let entry = KnowledgeEntry::new(kind, data)?;
        let mut entries = Self::write(&self.entries)?;
        let mut by_url = Self::write(&self.by_url)?;

        let existing = entry.url.as_ref().and_then(|url| by_url.get(url).copied());
        match existing {
            Some(i) if entries[i].content_hash == entry.content_hash => {
                tracing::debug!(url = ?entry.url, "Knowledge entry unchanged - skipping");
            }
            Some(i) => {
                tracing::debug!(url = ?entry.url, "Knowledge entry content changed - replacing");
                entries[i] = entry;
            }
            None => {
                if let Some(url) = &entry.url {
                    by_url.insert(url.clone(), entries.len());
                }
                entries.push(entry);
            }
        }

        Ok(())
    }

    async fn stored_hash(&self, url: &str) -> KnowledgeResult<Option<String>> {
        let entries = Self::read(&self.entries)?;
        let by_url = Self::read(&self.by_url)?;
        Ok(by_url
            .get(url)
            .and_then(|&i| entries.get(i))
            .map(|entry| entry.content_hash.clone()))
    }
}
