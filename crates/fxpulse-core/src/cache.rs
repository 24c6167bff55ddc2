//! Process-wide latest-snapshot cache shared by several views.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::snapshot::Snapshot;
use crate::UtcDateTime;

/// One published snapshot. Replaced whole, never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSnapshot {
    pub snapshot: Arc<Snapshot>,
    pub as_of: UtcDateTime,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct CacheInner {
    entry: Option<Arc<CachedSnapshot>>,
    max_age: Option<Duration>,
}

/// Thread-safe holder of the most recent snapshot.
///
/// Writers swap the whole entry in one step, so readers see either the old
/// or the new snapshot and never a mix.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries older than `max_age` read as absent.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entry: None,
                max_age: Some(max_age),
            })),
        }
    }

    /// Store `snapshot` unless the current entry describes a later time.
    ///
    /// Returns whether the entry was replaced.
    pub async fn publish(&self, snapshot: Arc<Snapshot>, as_of: UtcDateTime) -> bool {
        let mut store = self.inner.write().await;
        if store
            .entry
            .as_ref()
            .is_some_and(|current| current.as_of > as_of)
        {
            return false;
        }
        store.entry = Some(Arc::new(CachedSnapshot {
            snapshot,
            as_of,
            stored_at: Instant::now(),
        }));
        true
    }

    pub async fn latest(&self) -> Option<Arc<CachedSnapshot>> {
        let store = self.inner.read().await;
        let entry = store.entry.as_ref()?;
        if let Some(max_age) = store.max_age {
            if entry.stored_at.elapsed() > max_age {
                return None;
            }
        }
        Some(Arc::clone(entry))
    }

    pub async fn clear(&self) {
        self.inner.write().await.entry = None;
    }
}
