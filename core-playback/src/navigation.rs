//! Next/previous navigation policy.
//!
//! A "next" or "previous" command can mean three different things depending
//! on player state: restart the current track, move within its version set,
//! or move to an adjacent track in the queue. This module encodes the
//! precedence rules between those interpretations; the actual version-switch
//! side effects live in [`crate::switching`].

use crate::queue::PlayQueue;
use crate::switching::{VersionOverride, VersionSwitcher};
use crate::versions::VersionList;
use bridge_traits::playback::PlaybackController;
use core_runtime::config::NavigationSettings;
use core_runtime::events::{EventBus, PlayerEvent, StudioEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// What a navigation command ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The current track was restarted from zero.
    Restarted,
    /// Playback moved to a different version of the same track.
    SwitchedVersion,
    /// Playback moved to an adjacent track in the queue.
    ChangedTrack,
    /// Nothing left to navigate to.
    QueueExhausted,
}

enum Direction {
    Next,
    Previous,
}

/// Decides between version-level and track-level navigation.
pub struct VersionNavigator {
    state: Mutex<Option<VersionList>>,
    switcher: Arc<VersionSwitcher>,
    queue: Arc<PlayQueue>,
    playback: Arc<dyn PlaybackController>,
    events: EventBus,
    restart_threshold: Duration,
}

impl VersionNavigator {
    pub fn new(
        switcher: Arc<VersionSwitcher>,
        queue: Arc<PlayQueue>,
        playback: Arc<dyn PlaybackController>,
        events: EventBus,
        settings: &NavigationSettings,
    ) -> Self {
        Self {
            state: Mutex::new(None),
            switcher,
            queue,
            playback,
            events,
            restart_threshold: settings.restart_threshold(),
        }
    }

    /// Install the version list of the now-current track.
    pub fn load_versions(&self, list: VersionList) {
        debug!(track_id = %list.track_id(), count = list.len(), "version list loaded");
        *self.state.lock() = Some(list);
    }

    /// Drop version state, e.g. when the loaded track changes.
    pub fn clear_versions(&self) {
        *self.state.lock() = None;
    }

    /// `true` iff the current track has more than one version.
    pub fn has_versions(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .map(VersionList::has_versions)
            .unwrap_or(false)
    }

    /// Index of the selected version, when a track is loaded.
    pub fn current_version_index(&self) -> Option<usize> {
        self.state.lock().as_ref().map(VersionList::current_index)
    }

    /// Select the next version (wrapping). Returns `false` when no track is
    /// loaded or it has a single version; state is left unchanged then.
    pub async fn switch_to_next_version(&self) -> bool {
        self.switch_adjacent(Direction::Next).await
    }

    /// Select the previous version (wrapping). Same no-op rules as
    /// [`Self::switch_to_next_version`].
    pub async fn switch_to_previous_version(&self) -> bool {
        self.switch_adjacent(Direction::Previous).await
    }

    async fn switch_adjacent(&self, direction: Direction) -> bool {
        let (track_id, target_index, overrides) = {
            let state = self.state.lock();
            let Some(list) = state.as_ref() else {
                return false;
            };
            if !list.has_versions() {
                return false;
            }
            let target_index = match direction {
                Direction::Next => list.next_index(),
                Direction::Previous => list.previous_index(),
            };
            let Some(version) = list.get(target_index) else {
                return false;
            };
            (list.track_id(), target_index, VersionOverride::from(version))
        };

        // The switch side effects run outside the lock; concurrent commands
        // resolve as last-one-wins, which is the intended UI semantics.
        self.switcher
            .switch_version(track_id, target_index, overrides)
            .await;

        let mut state = self.state.lock();
        if let Some(list) = state.as_mut() {
            if list.track_id() == track_id {
                let _ = list.select(target_index);
            }
        }
        true
    }

    /// Handle a "next" command: version switch when possible, otherwise
    /// advance the track queue.
    pub async fn handle_next(&self) -> crate::error::Result<NavigationOutcome> {
        if self.switch_to_next_version().await {
            return Ok(NavigationOutcome::SwitchedVersion);
        }

        match self.queue.next() {
            Some(request) => {
                let track_id = request.track_id.clone();
                self.playback.play(request).await?;
                self.clear_versions();
                info!(track_id, "advanced to next track");
                self.events
                    .emit(StudioEvent::Player(PlayerEvent::TrackChanged { track_id }))
                    .ok();
                Ok(NavigationOutcome::ChangedTrack)
            }
            None => Ok(NavigationOutcome::QueueExhausted),
        }
    }

    /// Handle a "previous" command at the given playback position.
    ///
    /// Policy, in order: restart when more than the threshold into the
    /// track (conventional back-button semantics, taking precedence over
    /// version switching); else switch to the previous version; else step
    /// the queue back.
    pub async fn handle_previous(
        &self,
        position: Duration,
    ) -> crate::error::Result<NavigationOutcome> {
        if position > self.restart_threshold {
            self.playback.seek_to_start().await?;
            if let Some(track_id) = self.loaded_track_id() {
                self.events
                    .emit(StudioEvent::Player(PlayerEvent::Restarted { track_id }))
                    .ok();
            }
            return Ok(NavigationOutcome::Restarted);
        }

        if self.switch_to_previous_version().await {
            return Ok(NavigationOutcome::SwitchedVersion);
        }

        match self.queue.previous() {
            Some(request) => {
                let track_id = request.track_id.clone();
                self.playback.play(request).await?;
                self.clear_versions();
                info!(track_id, "stepped back to previous track");
                self.events
                    .emit(StudioEvent::Player(PlayerEvent::TrackChanged { track_id }))
                    .ok();
                Ok(NavigationOutcome::ChangedTrack)
            }
            None => Ok(NavigationOutcome::QueueExhausted),
        }
    }

    fn loaded_track_id(&self) -> Option<String> {
        self.state
            .lock()
            .as_ref()
            .map(|list| list.track_id().to_string())
    }
}
