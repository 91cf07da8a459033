//! Track-level play queue.
//!
//! The queue is the fallback target of next/previous navigation once version
//! switching does not apply. It is index-based and non-wrapping: stepping
//! past either end leaves the position unchanged and reports `None`.

use bridge_traits::playback::PlayRequest;
use parking_lot::Mutex;
use tracing::debug;

struct QueueState {
    entries: Vec<PlayRequest>,
    current: Option<usize>,
}

/// Ordered queue of playable tracks with a current position.
pub struct PlayQueue {
    state: Mutex<QueueState>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: Vec::new(),
                current: None,
            }),
        }
    }

    /// Replace the queue contents, realigning the position on
    /// `current_track_id` when it is present (falling back to the start).
    pub fn set_entries(&self, entries: Vec<PlayRequest>, current_track_id: Option<&str>) {
        let mut state = self.state.lock();
        state.current = match (current_track_id, entries.is_empty()) {
            (_, true) => None,
            (None, false) => Some(0),
            (Some(id), false) => Some(
                entries
                    .iter()
                    .position(|e| e.track_id == id)
                    .unwrap_or(0),
            ),
        };
        state.entries = entries;
    }

    /// Append a track to the end of the queue.
    pub fn add(&self, entry: PlayRequest) {
        let mut state = self.state.lock();
        state.entries.push(entry);
        if state.current.is_none() {
            state.current = Some(0);
        }
    }

    /// Remove a track by id, clamping the position when needed.
    pub fn remove(&self, track_id: &str) {
        let mut state = self.state.lock();
        let Some(index) = state.entries.iter().position(|e| e.track_id == track_id) else {
            return;
        };
        state.entries.remove(index);

        state.current = match state.current {
            None => None,
            Some(_) if state.entries.is_empty() => None,
            Some(current) if index < current => Some(current - 1),
            Some(current) => Some(current.min(state.entries.len() - 1)),
        };
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.current = None;
    }

    /// Advance to the following track, or `None` at the end of the queue.
    pub fn next(&self) -> Option<PlayRequest> {
        let mut state = self.state.lock();
        let current = state.current?;
        let next = current + 1;
        if next >= state.entries.len() {
            debug!("queue exhausted, no next track");
            return None;
        }
        state.current = Some(next);
        Some(state.entries[next].clone())
    }

    /// Step back to the preceding track, or `None` at the start.
    pub fn previous(&self) -> Option<PlayRequest> {
        let mut state = self.state.lock();
        let current = state.current?;
        if current == 0 {
            debug!("at start of queue, no previous track");
            return None;
        }
        state.current = Some(current - 1);
        Some(state.entries[current - 1].clone())
    }

    /// Move the position onto `track_id`, returning its entry.
    pub fn jump_to(&self, track_id: &str) -> Option<PlayRequest> {
        let mut state = self.state.lock();
        let index = state.entries.iter().position(|e| e.track_id == track_id)?;
        state.current = Some(index);
        Some(state.entries[index].clone())
    }

    /// The entry at the current position.
    pub fn current(&self) -> Option<PlayRequest> {
        let state = self.state.lock();
        state.current.map(|i| state.entries[i].clone())
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

impl Default for PlayQueue {
    fn default() -> Self {
        Self::new()
    }
}
