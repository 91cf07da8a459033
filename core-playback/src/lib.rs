//! # Playback Coordination Module
//!
//! Version-aware playback coordination for generated tracks.
//!
//! ## Overview
//!
//! This module handles:
//! - Version navigation policy (restart vs. version switch vs. track change)
//! - Consistent version switch application across playback and cached state
//! - The track-level play queue
//! - Speculative preloading of adjacent audio sources
//! - Signed audio URL expiry checks

pub mod error;
pub mod navigation;
pub mod preload;
pub mod queue;
pub mod switching;
pub mod url;
pub mod versions;

pub use error::{PlaybackError, Result};
pub use navigation::{NavigationOutcome, VersionNavigator};
pub use preload::{AudioPreloader, PreloadWindow};
pub use queue::PlayQueue;
pub use switching::{SwitchOutcome, VersionOverride, VersionSwitcher};
pub use versions::VersionList;
