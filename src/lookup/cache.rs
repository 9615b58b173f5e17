// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Per-evaluation memo of lookup results
//!
//! Lives only as long as one template evaluation. An empty entry records a
//! confirmed-absent object, which is different from no entry at all.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;

/// Cache key: everything that distinguishes one lookup from another
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectIdentity {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    /// Empty for List queries
    pub name: String,
    /// Canonical label selector, empty when none was given
    pub selector: String,
}

/// Lookup results keyed by [`ObjectIdentity`]
///
/// Entries are write-once: the first store for an identity wins, so a
/// document handed to one lookup never changes under a later one.
#[derive(Debug, Default)]
pub struct EphemeralCache {
    entries: RwLock<HashMap<ObjectIdentity, Vec<Value>>>,
}

impl EphemeralCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached documents for `id`, or `None` if it was never queried
    pub async fn lookup(&self, id: &ObjectIdentity) -> Option<Vec<Value>> {
        let entries = self.entries.read().await;
        let hit = entries.get(id).cloned();
        trace!(
            kind = %id.kind,
            namespace = %id.namespace,
            name = %id.name,
            hit = hit.is_some(),
            "Ephemeral cache lookup"
        );
        hit
    }

    /// Remember the documents returned for `id`
    pub async fn store(&self, id: ObjectIdentity, documents: Vec<Value>) {
        let mut entries = self.entries.write().await;
        entries.entry(id).or_insert(documents);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
