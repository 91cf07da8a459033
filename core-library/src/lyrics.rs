//! Cache for timestamped (word-aligned) lyrics.
//!
//! Aligned lyrics are produced once per rendered audio and never change, so
//! they cache well: a long TTL keeps repeated playback instant, and cleanup
//! weighs how often an entry was actually read so frequently replayed tracks
//! survive the size bound.

use bridge_traits::time::{Clock, SystemClock};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default lyrics retention (30 days).
pub const DEFAULT_LYRICS_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default entry bound.
pub const DEFAULT_LYRICS_MAX_ENTRIES: usize = 100;

/// Fraction of entries removed when the bound is exceeded.
const CLEANUP_FRACTION: f64 = 0.2;

/// One aligned word of a lyric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedWord {
    pub word: String,
    /// Start offset in seconds from track start.
    pub start_s: f64,
    /// End offset in seconds from track start.
    pub end_s: f64,
    /// Alignment confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Whether the aligner matched this word at all.
    pub aligned: bool,
}

/// Word-aligned lyrics plus the waveform envelope shipped alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedLyrics {
    pub words: Vec<AlignedWord>,
    pub waveform: Vec<f32>,
    /// Character error rate reported by the alignment service.
    pub error_rate: f64,
    /// Whether the lyrics arrived via streaming alignment.
    pub streamed: bool,
}

struct CachedLyrics {
    data: TimestampedLyrics,
    cached_at_ms: i64,
    access_count: u64,
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricsCacheStats {
    pub total_entries: usize,
    pub oldest_entry_ms: Option<i64>,
    pub newest_entry_ms: Option<i64>,
}

/// Bounded cache of aligned lyrics keyed by `(task_id, audio_id)`.
pub struct LyricsCache {
    entries: Mutex<HashMap<String, CachedLyrics>>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl LyricsCache {
    pub fn new() -> Self {
        Self::with_clock(
            DEFAULT_LYRICS_TTL,
            DEFAULT_LYRICS_MAX_ENTRIES,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
            clock,
        }
    }

    fn cache_key(task_id: &str, audio_id: &str) -> String {
        format!("{task_id}-{audio_id}")
    }

    /// Fetch cached lyrics, bumping the entry's access count on a hit.
    pub fn get(&self, task_id: &str, audio_id: &str) -> Option<TimestampedLyrics> {
        let key = Self::cache_key(task_id, audio_id);
        let now_ms = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock();

        let expired = match entries.get(&key) {
            None => {
                debug!(task_id, audio_id, "lyrics cache miss");
                return None;
            }
            Some(entry) => {
                now_ms.saturating_sub(entry.cached_at_ms) > self.ttl.as_millis() as i64
            }
        };

        if expired {
            info!(task_id, audio_id, "lyrics cache entry expired, removing");
            entries.remove(&key);
            return None;
        }

        let entry = entries.get_mut(&key)?;
        entry.access_count += 1;
        debug!(
            task_id,
            audio_id,
            access_count = entry.access_count,
            "lyrics cache hit"
        );
        Some(entry.data.clone())
    }

    /// Store lyrics for a rendered audio, then shrink past the size bound.
    pub fn set(&self, task_id: &str, audio_id: &str, data: TimestampedLyrics) {
        let key = Self::cache_key(task_id, audio_id);
        let entry = CachedLyrics {
            data,
            cached_at_ms: self.clock.unix_timestamp_millis(),
            access_count: 1,
        };

        let mut entries = self.entries.lock();
        entries.insert(key, entry);
        Self::cleanup(&mut entries, self.max_entries);
    }

    /// Remove the least-used fifth of the cache once the bound is exceeded.
    ///
    /// Eviction order is least accessed first, oldest first within equal
    /// access counts.
    fn cleanup(entries: &mut HashMap<String, CachedLyrics>, max_entries: usize) {
        if entries.len() <= max_entries {
            return;
        }

        let mut order: Vec<(String, u64, i64)> = entries
            .iter()
            .map(|(key, e)| (key.clone(), e.access_count, e.cached_at_ms))
            .collect();
        order.sort_by(|a, b| (a.1, a.2).cmp(&(b.1, b.2)));

        let to_remove = ((entries.len() as f64) * CLEANUP_FRACTION).ceil() as usize;
        for (key, _, _) in order.into_iter().take(to_remove) {
            entries.remove(&key);
        }
        info!(removed = to_remove, "lyrics cache cleanup completed");
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> LyricsCacheStats {
        let entries = self.entries.lock();
        let timestamps: Vec<i64> = entries.values().map(|e| e.cached_at_ms).collect();
        LyricsCacheStats {
            total_entries: entries.len(),
            oldest_entry_ms: timestamps.iter().min().copied(),
            newest_entry_ms: timestamps.iter().max().copied(),
        }
    }
}

impl Default for LyricsCache {
    fn default() -> Self {
        Self::new()
    }
}
