//! # Host Bridge Traits
//!
//! Capability contracts between the studio player core and its host shell.
//!
//! ## Overview
//!
//! The core coordinates track versions, caching and realtime state but owns
//! no platform surface of its own: audio output, realtime transport, the
//! host's query cache and its notification UI all live outside. Each trait
//! here represents one such capability, implemented differently per host
//! (desktop shell, web player, test harness).
//!
//! ## Traits
//!
//! ### Playback
//! - [`PlaybackController`](playback::PlaybackController) - play/pause/position control of the host audio engine
//! - [`AudioSourceLoader`](playback::AudioSourceLoader) - speculative preloading of audio sources
//!
//! ### Data flow
//! - [`ChangeFeed`](realtime::ChangeFeed) - user-scoped row-change subscription
//! - [`QueryCache`](querycache::QueryCache) - invalidate-by-key signal to the host read-model cache
//!
//! ### User surface
//! - [`Notifier`](notify::Notifier) - success/error notices
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Host implementations should convert platform-specific failures into it
//! with actionable messages; the core decides per call site whether a
//! bridge failure is surfaced, logged or swallowed.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc`.

pub mod error;
pub mod notify;
pub mod playback;
pub mod querycache;
pub mod realtime;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use notify::{Notice, Notifier};
pub use playback::{AudioSourceLoader, NowPlaying, PlayRequest, PlaybackController, PreloadHandle};
pub use querycache::{QueryCache, QueryKey};
pub use realtime::{ChangeFeed, ChangeFilter, ChangeSubscription, TrackChangeRecord};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
