//! Local track store fed by the realtime sync layer.
//!
//! Two read-models are kept in parallel, matching the host UI's access
//! patterns: an ordered "all tracks" collection (library views iterate it)
//! and a single-track-by-id cache (detail views and the player read it).
//! Both are written on every upsert; the by-id entry is overwritten
//! unconditionally because the server is the sole writer on that path.

use crate::cache::{CacheManager, DEFAULT_CACHE_TTL};
use crate::models::{Track, TrackId, TrackStatus};
use bridge_traits::time::{Clock, SystemClock};
use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// In-memory projection of the current user's tracks.
pub struct TrackStore {
    all: Mutex<Vec<Track>>,
    by_id: CacheManager<Track>,
    clock: Arc<dyn Clock>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL, clock)
    }

    /// Build a store whose by-id cache uses the given TTL.
    pub fn with_ttl(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            all: Mutex::new(Vec::new()),
            by_id: CacheManager::with_clock(ttl, clock.clone()),
            clock,
        }
    }

    /// Replace the collection wholesale, e.g. after an initial fetch.
    pub fn prime(&self, tracks: Vec<Track>) {
        for track in &tracks {
            self.by_id.set(track.id.to_string(), track.clone());
        }
        *self.all.lock() = tracks;
    }

    /// Insert or replace a track by id.
    ///
    /// The "all tracks" collection patches the existing slot in place
    /// (preserving order) or appends; an id never appears twice. The by-id
    /// entry is overwritten with the incoming state.
    pub fn upsert(&self, track: Track) {
        {
            let mut all = self.all.lock();
            match all.iter_mut().find(|t| t.id == track.id) {
                Some(slot) => *slot = track.clone(),
                None => all.push(track.clone()),
            }
        }
        self.by_id.set(track.id.to_string(), track);
    }

    /// Single-track lookup through the TTL cache.
    pub fn get(&self, id: &TrackId) -> Option<Track> {
        self.by_id.get(&id.to_string())
    }

    /// Snapshot of the ordered collection.
    pub fn all(&self) -> Vec<Track> {
        self.all.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.all.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.lock().is_empty()
    }

    /// Drop everything, e.g. on sign-out.
    pub fn clear(&self) {
        self.all.lock().clear();
        self.by_id.clear();
    }

    /// Tracks stuck in `Processing` longer than `threshold`.
    ///
    /// Generation normally settles within minutes; anything older has most
    /// likely lost its completion event and needs a manual refresh.
    pub fn stale_processing(&self, threshold: Duration) -> Vec<Track> {
        let cutoff = self.clock.now()
            - ChronoDuration::from_std(threshold).unwrap_or(ChronoDuration::zero());
        let stale: Vec<Track> = self
            .all
            .lock()
            .iter()
            .filter(|t| t.status == TrackStatus::Processing && t.updated_at < cutoff)
            .cloned()
            .collect();
        if !stale.is_empty() {
            debug!(count = stale.len(), "stale processing tracks detected");
        }
        stale
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}
