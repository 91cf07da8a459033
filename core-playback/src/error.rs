//! # Playback Error Types
//!
//! Error types for version navigation and playback coordination.

use thiserror::Error;

/// Errors that can occur during playback coordination.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Requested version index is outside the track's version list.
    #[error("Version index {index} out of range (track has {available} versions)")]
    VersionOutOfRange { index: usize, available: usize },

    /// A version list violated its structural invariants.
    #[error("Invalid version list: {0}")]
    InvalidVersionList(String),

    /// The host playback engine reported a failure.
    #[error("Playback engine error: {0}")]
    Engine(#[from] bridge_traits::BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
