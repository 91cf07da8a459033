//! Realtime change feed abstraction.
//!
//! The backend pushes row-level change notifications for the authenticated
//! user's tracks. Hosts adapt their realtime transport (websocket channel,
//! server-sent events) to this subscription interface; the core consumes one
//! record at a time and applies them in arrival order.
//!
//! Delivery is pull-based over a bounded queue rather than callback-based:
//! the subscription owns the buffer, `next` awaits the following record, and
//! backpressure falls on the transport adapter instead of on the core.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filter scoping a subscription to one user's tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    /// Identifier of the authenticated user whose rows are observed.
    pub user_id: String,
}

impl ChangeFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Raw track row delivered by the change feed.
///
/// Fields mirror the backend table; the core converts records into its own
/// domain model and treats the server as the sole writer (a later record for
/// the same `id` fully supersedes an earlier one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackChangeRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Lifecycle status as reported by the backend
    /// (`pending`, `processing`, `completed`, `failed`).
    pub status: String,
    pub audio_url: Option<String>,
    pub cover_url: Option<String>,
    pub duration_secs: Option<f64>,
    pub lyrics: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Host-provided realtime transport.
#[async_trait::async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open a subscription delivering changes matching the filter.
    async fn subscribe(&self, filter: ChangeFilter) -> Result<Box<dyn ChangeSubscription>>;
}

/// An open subscription on a change feed.
///
/// Modeled as an owned stream: `next` yields records in arrival order and
/// returns `None` once the subscription is closed (explicitly or by the
/// transport going away).
#[async_trait::async_trait]
pub trait ChangeSubscription: Send {
    /// Await the next changed record, or `None` when the stream has ended.
    async fn next(&mut self) -> Option<TrackChangeRecord>;

    /// Tear the subscription down. Subsequent `next` calls return `None`.
    async fn close(&mut self) -> Result<()>;
}
