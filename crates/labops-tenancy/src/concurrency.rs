//! # Optimistic Concurrency Control
//!
//! Shared entities (cases, routes, pickup requests) carry an integer
//! version starting at 0. A writer submits the version it read; the
//! write is accepted only when that version still matches the stored
//! one, and each accepted write increments the version by exactly 1.
//!
//! Conflicts are never auto-merged. The losing writer gets a
//! [`ConcurrencyError`] naming both versions and must re-read before
//! retrying; the stored state is untouched.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────────

/// A stale-version write rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("version conflict on {entity_id}: expected {expected_version}, stored {actual_version}")]
pub struct ConcurrencyError {
    /// Display form of the entity identifier.
    pub entity_id: String,
    /// The version the writer read.
    pub expected_version: u64,
    /// The version actually stored.
    pub actual_version: u64,
}

// ─── Versioned Entities ──────────────────────────────────────────────

/// Implemented by entities under optimistic concurrency control.
pub trait Versioned {
    /// Display form of the entity identifier, used in conflict errors.
    fn entity_id(&self) -> String;

    /// The current stored version.
    fn version(&self) -> u64;

    /// Advance the version after an accepted write.
    fn set_version(&mut self, version: u64);
}

impl Versioned for labops_core::Case {
    fn entity_id(&self) -> String {
        self.id.to_string()
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

// ─── The Guard ───────────────────────────────────────────────────────

/// Compare-and-increment check applied before any mutation of a
/// versioned entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrencyGuard;

impl ConcurrencyGuard {
    /// Accept the update iff `expected_version` matches the stored
    /// version, returning the new version to write.
    pub fn apply_update<T: Versioned>(
        stored: &T,
        expected_version: u64,
    ) -> Result<u64, ConcurrencyError> {
        let actual = stored.version();
        if expected_version == actual {
            Ok(actual + 1)
        } else {
            Err(ConcurrencyError {
                entity_id: stored.entity_id(),
                expected_version,
                actual_version: actual,
            })
        }
    }
}

// ─── Storage Contract ────────────────────────────────────────────────

/// Compare-and-swap storage for versioned entities.
///
/// `update` must be atomic with respect to other writers of the same
/// key: the version check and the write happen under one critical
/// section.
pub trait VersionedStore<K, T: Versioned> {
    /// Insert a new entity. Its version must be 0.
    fn insert(&self, key: K, entity: T);

    /// Read a snapshot of the entity.
    fn get(&self, key: &K) -> Option<T>;

    /// Replace the entity iff `expected_version` matches the stored
    /// version; the stored entity's version advances to
    /// `expected_version + 1`. Returns the new version.
    fn update(&self, key: &K, entity: T, expected_version: u64) -> Result<u64, ConcurrencyError>;
}

/// In-memory reference implementation of [`VersionedStore`].
#[derive(Debug)]
pub struct InMemoryVersionedStore<K, T> {
    entities: RwLock<HashMap<K, T>>,
}

impl<K, T> Default for InMemoryVersionedStore<K, T> {
    fn default() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, T> InMemoryVersionedStore<K, T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, T: Clone> InMemoryVersionedStore<K, T> {
    /// Snapshot of every stored entity, in no particular order.
    pub fn values(&self) -> Vec<T> {
        let guard = self.entities.read().unwrap_or_else(|e| e.into_inner());
        guard.values().cloned().collect()
    }
}

impl<K, T> VersionedStore<K, T> for InMemoryVersionedStore<K, T>
where
    K: std::hash::Hash + Eq + Clone,
    T: Versioned + Clone,
{
    fn insert(&self, key: K, entity: T) {
        let mut guard = self.entities.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(key, entity);
    }

    fn get(&self, key: &K) -> Option<T> {
        let guard = self.entities.read().unwrap_or_else(|e| e.into_inner());
        guard.get(key).cloned()
    }

    fn update(&self, key: &K, mut entity: T, expected_version: u64) -> Result<u64, ConcurrencyError> {
        let mut guard = self.entities.write().unwrap_or_else(|e| e.into_inner());
        let stored = guard.get(key).ok_or_else(|| ConcurrencyError {
            entity_id: entity.entity_id(),
            expected_version,
            // A missing entity reads as version 0 never written; the
            // caller should have inserted first.
            actual_version: 0,
        })?;
        let new_version = ConcurrencyGuard::apply_update(stored, expected_version)?;
        entity.set_version(new_version);
        guard.insert(key.clone(), entity);
        Ok(new_version)
    }
}
