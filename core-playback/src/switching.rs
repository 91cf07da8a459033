//! Version switch application.
//!
//! Whatever UI surface requests a version change (player controls, version
//! pickers, library cards), the effect must be the same: the old audio never
//! keeps playing under the new version's identity, stale read-models get
//! invalidated, and the user sees which version is now active. This module
//! owns that sequence.

use bridge_traits::notify::{Notice, Notifier};
use bridge_traits::playback::PlaybackController;
use bridge_traits::querycache::{QueryCache, QueryKey};
use core_library::models::TrackId;
use core_runtime::events::{EventBus, PlayerEvent, StudioEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Per-version field overrides applied when a version becomes current.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionOverride {
    pub title: Option<String>,
    pub audio_url: Option<String>,
    pub cover_url: Option<String>,
    pub duration: Option<Duration>,
    pub lyrics: Option<String>,
}

impl From<&core_library::models::TrackVersion> for VersionOverride {
    fn from(version: &core_library::models::TrackVersion) -> Self {
        Self {
            title: version.title.clone(),
            audio_url: version.audio_url.clone(),
            cover_url: version.cover_url.clone(),
            duration: version.duration,
            lyrics: version.lyrics.clone(),
        }
    }
}

/// Result of a version switch.
///
/// The operation is explicit: callers may await it and branch on the
/// outcome, or discard the future result for fire-and-forget semantics.
/// It never returns an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The switch was applied; `version_number` is 1-based.
    Switched { version_number: u32 },
    /// Some step failed; the error was logged and reported to the user.
    Failed { message: String },
}

impl SwitchOutcome {
    pub fn is_switched(&self) -> bool {
        matches!(self, SwitchOutcome::Switched { .. })
    }
}

/// Applies version changes consistently across playback and cached state.
pub struct VersionSwitcher {
    playback: Arc<dyn PlaybackController>,
    query_cache: Arc<dyn QueryCache>,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
}

impl VersionSwitcher {
    pub fn new(
        playback: Arc<dyn PlaybackController>,
        query_cache: Arc<dyn QueryCache>,
        notifier: Arc<dyn Notifier>,
        events: EventBus,
    ) -> Self {
        Self {
            playback,
            query_cache,
            notifier,
            events,
        }
    }

    /// Switch `track_id` to the version at `version_index` (0-based).
    ///
    /// Effect order:
    /// 1. pause playback iff the switched track is the currently loaded one
    /// 2. invalidate the track-list and single-track read-models
    /// 3. success notification naming the 1-based version number
    ///
    /// Any failure is caught, logged with context and surfaced as an error
    /// notification; the returned outcome is the only signal to the caller.
    pub async fn switch_version(
        &self,
        track_id: TrackId,
        version_index: usize,
        overrides: VersionOverride,
    ) -> SwitchOutcome {
        let version_number = (version_index + 1) as u32;

        match self.apply(track_id, version_index).await {
            Ok(()) => {
                info!(
                    %track_id,
                    version_number,
                    title = overrides.title.as_deref().unwrap_or_default(),
                    "version switch applied"
                );
                self.notify_success(version_number).await;
                self.events
                    .emit(StudioEvent::Player(PlayerEvent::VersionSwitched {
                        track_id: track_id.to_string(),
                        version_number,
                    }))
                    .ok();
                SwitchOutcome::Switched { version_number }
            }
            Err(e) => {
                let message = e.to_string();
                error!(%track_id, version_index, error = %message, "version switch failed");
                self.notifier
                    .error(
                        Notice::new("Failed to switch version")
                            .with_body("Try refreshing the track list"),
                    )
                    .await
                    .ok();
                SwitchOutcome::Failed { message }
            }
        }
    }

    async fn apply(
        &self,
        track_id: TrackId,
        version_index: usize,
    ) -> bridge_traits::error::Result<()> {
        let track_key = track_id.to_string();

        // A switch never continues playing the old audio under the new
        // version's identity.
        if let Some(now_playing) = self.playback.now_playing().await? {
            if now_playing.track_id == track_key {
                debug!(%track_id, version_index, "pausing current track before switch");
                self.playback.pause().await?;
            }
        }

        self.query_cache.invalidate(QueryKey::Tracks).await?;
        self.query_cache
            .invalidate(QueryKey::Track(track_key))
            .await?;

        Ok(())
    }

    async fn notify_success(&self, version_number: u32) {
        let notice = Notice::new(format!("Switched to version {version_number}"));
        if let Err(e) = self.notifier.success(notice).await {
            debug!(error = %e, "success notice delivery failed");
        }
    }
}
