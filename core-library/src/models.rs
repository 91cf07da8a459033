//! Domain models for generated tracks and their versions.
//!
//! These are the core's local projections of backend rows. They carry only
//! the fields the playback and sync layers consume; the full backend schema
//! stays behind the change feed.

use crate::error::{LibraryError, Result};
use bridge_traits::realtime::TrackChangeRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| LibraryError::InvalidInput {
                field: "track_id".to_string(),
                message: e.to_string(),
            })
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a track version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub Uuid);

impl VersionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| LibraryError::InvalidInput {
                field: "version_id".to_string(),
                message: e.to_string(),
            })
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Track Lifecycle
// =============================================================================

/// Generation lifecycle of a track.
///
/// Tracks are created `Pending`, move to `Processing` while the provider
/// renders audio, and settle in `Completed` or `Failed`. Completion is the
/// point at which a track gains authoritative version and stem data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TrackStatus {
    /// Returns `true` once the backend will no longer change this track on
    /// its own (generation finished one way or the other).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackStatus::Completed | TrackStatus::Failed)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TrackStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Pending => "pending",
            TrackStatus::Processing => "processing",
            TrackStatus::Completed => "completed",
            TrackStatus::Failed => "failed",
        }
    }
}

impl FromStr for TrackStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(TrackStatus::Pending),
            "processing" => Ok(TrackStatus::Processing),
            "completed" => Ok(TrackStatus::Completed),
            "failed" => Ok(TrackStatus::Failed),
            other => Err(LibraryError::InvalidInput {
                field: "status".to_string(),
                message: format!("unknown track status '{other}'"),
            }),
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Track
// =============================================================================

/// Local projection of a generated track.
///
/// Identity is `id`. Instances are created when first fetched or when the
/// first realtime event for the id arrives, and are replaced wholesale by
/// later events (the server is the sole writer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub user_id: String,
    pub title: String,
    pub status: TrackStatus,
    pub audio_url: Option<String>,
    pub cover_url: Option<String>,
    pub duration: Option<Duration>,
    pub lyrics: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Track {
    /// Convert a raw change-feed record into the local projection.
    ///
    /// Records with an unknown id format or status are rejected rather than
    /// coerced; the sync layer logs and skips them.
    pub fn from_change_record(record: &TrackChangeRecord) -> Result<Self> {
        Ok(Self {
            id: TrackId::from_string(&record.id)?,
            user_id: record.user_id.clone(),
            title: record.title.clone(),
            status: record.status.parse()?,
            audio_url: record.audio_url.clone(),
            cover_url: record.cover_url.clone(),
            duration: record
                .duration_secs
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
            lyrics: record.lyrics.clone(),
            error_message: record.error_message.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Whether the track has playable audio.
    pub fn is_playable(&self) -> bool {
        self.status.is_completed() && self.audio_url.is_some()
    }
}

// =============================================================================
// Track Versions
// =============================================================================

/// One generated audio variant of a logical track.
///
/// Version lists are ordered by creation; `version_number` is 1-based and
/// stable across reads. At most one version of a track is the master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackVersion {
    pub id: VersionId,
    pub track_id: TrackId,
    pub version_number: u32,
    pub is_master: bool,
    pub title: Option<String>,
    pub audio_url: Option<String>,
    pub cover_url: Option<String>,
    pub duration: Option<Duration>,
    pub lyrics: Option<String>,
}

impl TrackVersion {
    pub fn new(track_id: TrackId, version_number: u32) -> Self {
        Self {
            id: VersionId::new(),
            track_id,
            version_number,
            is_master: false,
            title: None,
            audio_url: None,
            cover_url: None,
            duration: None,
            lyrics: None,
        }
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn as_master(mut self) -> Self {
        self.is_master = true;
        self
    }

    /// Whether this version can actually be played.
    pub fn is_playable(&self) -> bool {
        self.audio_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [
            TrackStatus::Pending,
            TrackStatus::Processing,
            TrackStatus::Completed,
            TrackStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<TrackStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<TrackStatus>().is_err());
    }

    #[test]
    fn status_terminality() {
        assert!(TrackStatus::Completed.is_terminal());
        assert!(TrackStatus::Failed.is_terminal());
        assert!(!TrackStatus::Processing.is_terminal());
        assert!(!TrackStatus::Pending.is_terminal());
    }

    #[test]
    fn track_from_change_record() {
        let id = TrackId::new();
        let record = TrackChangeRecord {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            title: "Velvet Static".to_string(),
            status: "completed".to_string(),
            audio_url: Some("https://cdn.example/a.mp3".to_string()),
            cover_url: None,
            duration_secs: Some(201.5),
            lyrics: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let track = Track::from_change_record(&record).unwrap();
        assert_eq!(track.id, id);
        assert_eq!(track.status, TrackStatus::Completed);
        assert!(track.is_playable());

        let bad_status = TrackChangeRecord {
            status: "exploded".to_string(),
            ..record
        };
        assert!(Track::from_change_record(&bad_status).is_err());
    }

    #[test]
    fn version_builder() {
        let track_id = TrackId::new();
        let version = TrackVersion::new(track_id, 2)
            .with_audio_url("https://cdn.example/v2.mp3")
            .as_master();

        assert_eq!(version.track_id, track_id);
        assert_eq!(version.version_number, 2);
        assert!(version.is_master);
        assert!(version.is_playable());
    }
}
