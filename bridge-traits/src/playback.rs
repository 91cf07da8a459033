//! Playback bridge traits.
//!
//! These abstractions let the core coordinate playback without owning an
//! audio engine. Host applications (desktop shells, web players) provide
//! concrete implementations backed by whatever media stack they ship, and
//! the core restricts itself to the handful of control points it needs:
//! starting a track, pausing, restarting, and observing what is currently
//! loaded.

use crate::error::Result;
use std::time::Duration;
use uuid::Uuid;

/// Request describing the track (or track version) a host engine should load.
///
/// The `track_id` is the core's identity for the loaded audio; when a version
/// switch replays the same logical track with different audio, the request
/// carries the version's own field overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    /// Opaque track identifier, owned by the core.
    pub track_id: String,
    /// Display title for the host media session.
    pub title: String,
    /// Audio source URL to load.
    pub audio_url: String,
    /// Optional artwork URL.
    pub cover_url: Option<String>,
    /// Track duration, when known ahead of load.
    pub duration: Option<Duration>,
}

impl PlayRequest {
    /// Construct a request for the given track and audio source.
    pub fn new(
        track_id: impl Into<String>,
        title: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            title: title.into(),
            audio_url: audio_url.into(),
            cover_url: None,
            duration: None,
        }
    }

    /// Attach an artwork URL.
    pub fn with_cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    /// Attach a known duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Snapshot of the engine's currently loaded track.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    /// Track identifier from the originating [`PlayRequest`].
    pub track_id: String,
    /// Current playback position.
    pub position: Duration,
    /// Whether the engine is actively playing (vs. paused).
    pub is_playing: bool,
}

/// Control surface of the host audio engine.
///
/// The core calls `pause` when a version switch must not continue playing the
/// old audio under the new version's identity, and reads `now_playing` to make
/// navigation decisions.
#[async_trait::async_trait]
pub trait PlaybackController: Send + Sync {
    /// Load and play the requested track, replacing whatever is loaded.
    async fn play(&self, request: PlayRequest) -> Result<()>;

    /// Pause playback, keeping the current track loaded.
    async fn pause(&self) -> Result<()>;

    /// Seek the current track back to its start without changing play state.
    async fn seek_to_start(&self) -> Result<()>;

    /// Snapshot of the currently loaded track, or `None` when idle.
    async fn now_playing(&self) -> Result<Option<NowPlaying>>;
}

/// Handle for an audio source the host has begun preloading.
///
/// Handles are issued by [`AudioSourceLoader::begin_preload`] and owned by the
/// core's preloader until released.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreloadHandle {
    id: Uuid,
    url: String,
}

impl PreloadHandle {
    /// Construct a handle for the given source URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
        }
    }

    /// URL of the source this handle tracks.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Unique handle identity.
    pub fn id(&self) -> &Uuid {
        &self.id
    }
}

/// Speculative audio loading capability.
///
/// Implementations typically create a lazily-loading media element or issue a
/// ranged fetch to warm caches. Preloading is an optimization only; failures
/// carry no correctness impact and the core drops failed handles silently.
#[async_trait::async_trait]
pub trait AudioSourceLoader: Send + Sync {
    /// Start loading the given URL in the background.
    async fn begin_preload(&self, url: &str) -> Result<PreloadHandle>;

    /// Release a previously issued handle, clearing the backing source.
    async fn release(&self, handle: PreloadHandle) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_request_builder() {
        let request = PlayRequest::new("track-1", "Neon Skyline", "https://cdn.example/a.mp3")
            .with_cover_url("https://cdn.example/a.jpg")
            .with_duration(Duration::from_secs(184));

        assert_eq!(request.track_id, "track-1");
        assert_eq!(request.cover_url.as_deref(), Some("https://cdn.example/a.jpg"));
        assert_eq!(request.duration, Some(Duration::from_secs(184)));
    }

    #[test]
    fn preload_handles_are_unique_per_issue() {
        let a = PreloadHandle::new("https://cdn.example/a.mp3");
        let b = PreloadHandle::new("https://cdn.example/a.mp3");
        assert_eq!(a.url(), b.url());
        assert_ne!(a.id(), b.id());
    }
}
