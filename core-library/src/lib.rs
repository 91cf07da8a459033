//! # Track Library Module
//!
//! Owns the local projections of the user's generated tracks and the caching
//! primitives the rest of the core builds on.
//!
//! ## Overview
//!
//! This module manages:
//! - Domain models for tracks, versions and aligned lyrics
//! - A generic TTL cache with oldest-first eviction ([`cache::CacheManager`])
//! - The dual read-model track store fed by realtime sync ([`store::TrackStore`])
//! - The bounded lyrics cache ([`lyrics::LyricsCache`])

pub mod cache;
pub mod error;
pub mod lyrics;
pub mod models;
pub mod store;

pub use error::{LibraryError, Result};
pub use models::{Track, TrackId, TrackStatus, TrackVersion, VersionId};
pub use store::TrackStore;
