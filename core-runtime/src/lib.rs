//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the studio player core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - Request rate limiting
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core modules depend
//! on. It establishes the logging conventions, configuration surface and
//! event broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod limiter;
pub mod logging;

pub use config::StudioConfig;
pub use error::{Error, Result};
pub use events::{EventBus, PlayerEvent, StudioEvent, TrackEvent};
pub use limiter::{RateLimitDecision, RateLimiter};
