//! Read-model cache invalidation.
//!
//! The host UI keeps derived read-models (track lists, version lists, stem
//! lists) in its own query cache. The core never reads that cache; it only
//! signals which keys have gone stale so the host refetches on next render.

use crate::error::Result;
use std::fmt;

/// Keys of the host's cached read-models.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// The user's full track list.
    Tracks,
    /// A single track by id.
    Track(String),
    /// Version list of a track.
    TrackVersions(String),
    /// Stem list of a track.
    TrackStems(String),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Tracks => write!(f, "tracks"),
            QueryKey::Track(id) => write!(f, "track:{id}"),
            QueryKey::TrackVersions(id) => write!(f, "track-versions:{id}"),
            QueryKey::TrackStems(id) => write!(f, "track-stems:{id}"),
        }
    }
}

/// Invalidate-by-key surface of the host query cache.
#[async_trait::async_trait]
pub trait QueryCache: Send + Sync {
    /// Mark the read-model under `key` stale.
    async fn invalidate(&self, key: QueryKey) -> Result<()>;
}
