// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory set of notifications whose content is being generated.

use std::sync::Arc;

use beacon_core::NotificationId;
use dashmap::DashSet;

/// Concurrency-safe in-progress set keyed by notification id.
///
/// Constructed once at startup and shared by reference; there is no global.
#[derive(Debug, Default)]
pub struct GenerationDeduplicator {
    in_progress: DashSet<NotificationId>,
}

impl GenerationDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` in progress. Returns `false` if it already was.
    pub fn try_acquire(&self, id: &NotificationId) -> bool {
        self.in_progress.insert(id.clone())
    }

    /// Clears the mark for `id`, whether or not it was set.
    pub fn release(&self, id: &NotificationId) {
        self.in_progress.remove(id);
    }

    pub fn is_in_progress(&self, id: &NotificationId) -> bool {
        self.in_progress.contains(id)
    }

    pub fn len(&self) -> usize {
        self.in_progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_progress.is_empty()
    }

    /// Scoped acquisition: the mark is cleared when the guard drops,
    /// including during unwinding.
    pub fn acquire(self: &Arc<Self>, id: &NotificationId) -> Option<GenerationGuard> {
        self.try_acquire(id).then(|| GenerationGuard {
            dedup: Arc::clone(self),
            id: id.clone(),
        })
    }
}

/// Releases its notification's in-progress mark on drop.
#[derive(Debug)]
pub struct GenerationGuard {
    dedup: Arc<GenerationDeduplicator>,
    id: NotificationId,
}

impl GenerationGuard {
    pub fn id(&self) -> &NotificationId {
        &self.id
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.dedup.release(&self.id);
    }
}
