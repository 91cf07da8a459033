//! # Realtime Sync Module
//!
//! Keeps local track state consistent with the backend change feed.
//!
//! ## Overview
//!
//! This module owns the push-based reconciliation path:
//! - Subscribing to the user-scoped change feed
//! - Upserting incoming records into the local [`TrackStore`](core_library::store::TrackStore)
//! - Cascading read-model invalidation when tracks complete
//! - Surfacing completion/failure notifications and events
//!
//! ## Components
//!
//! - **Realtime Coordinator** (`realtime`): Subscription lifecycle and the apply loop

pub mod error;
pub mod realtime;

pub use error::{Result, SyncError};
pub use realtime::RealtimeTrackSync;
