//! # Core Configuration Module
//!
//! Runtime configuration for the studio player core.
//!
//! ## Overview
//!
//! Every tunable the core exposes lives here, grouped per subsystem and
//! aggregated in [`StudioConfig`]. Hosts construct a config programmatically
//! with the builder setters or load one from JSON, then validate before
//! wiring up the core.
//!
//! ```rust
//! use core_runtime::config::StudioConfig;
//!
//! let config = StudioConfig::default();
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TTL-cache tuning for track read-models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry time-to-live in seconds (default: 5 minutes)
    pub ttl_secs: u64,
    /// Size bound enforced by oldest-first eviction (default: 100)
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 5 * 60,
            max_entries: 100,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Lyrics-cache tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsCacheSettings {
    /// Entry time-to-live in seconds (default: 30 days)
    pub ttl_secs: u64,
    /// Size bound (default: 100)
    pub max_entries: usize,
}

impl Default for LyricsCacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 24 * 60 * 60,
            max_entries: 100,
        }
    }
}

impl LyricsCacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Speculative audio loading tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadSettings {
    /// How many upcoming sources the player preloads (default: 2)
    pub max_preload: usize,
    /// Radius of the symmetric prefetch window around the current
    /// position (default: 2)
    pub prefetch_radius: usize,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            max_preload: 2,
            prefetch_radius: 2,
        }
    }
}

/// Navigation policy constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// Back-press restarts the current track when the position exceeds
    /// this many seconds (default: 3)
    pub restart_threshold_secs: u64,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            restart_threshold_secs: 3,
        }
    }
}

impl NavigationSettings {
    pub fn restart_threshold(&self) -> Duration {
        Duration::from_secs(self.restart_threshold_secs)
    }
}

/// Fixed-window rate limiter tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests allowed per window (default: 10)
    pub max_requests: u32,
    /// Window length in seconds (default: 60)
    pub window_secs: u64,
    /// Sweep interval for expired windows in seconds (default: 60)
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
            sweep_interval_secs: 60,
        }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Realtime sync tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// A track still `processing` after this many seconds is reported
    /// stale on coordinator start (default: 10 minutes)
    pub stale_processing_threshold_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            stale_processing_threshold_secs: 10 * 60,
        }
    }
}

impl SyncSettings {
    pub fn stale_processing_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_processing_threshold_secs)
    }
}

/// Aggregated core configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub cache: CacheSettings,
    pub lyrics: LyricsCacheSettings,
    pub preload: PreloadSettings,
    pub navigation: NavigationSettings,
    pub rate_limit: RateLimitSettings,
    pub sync: SyncSettings,
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON document; missing sections fall
    /// back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StudioConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_cache(mut self, cache: CacheSettings) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_preload(mut self, preload: PreloadSettings) -> Self {
        self.preload = preload;
        self
    }

    pub fn with_navigation(mut self, navigation: NavigationSettings) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitSettings) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(Error::Config("cache.ttl_secs must be greater than 0".into()));
        }
        if self.cache.max_entries == 0 {
            return Err(Error::Config("cache.max_entries must be at least 1".into()));
        }
        if self.lyrics.max_entries == 0 {
            return Err(Error::Config("lyrics.max_entries must be at least 1".into()));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(Error::Config(
                "rate_limit.max_requests must be at least 1".into(),
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(Error::Config(
                "rate_limit.window_secs must be greater than 0".into(),
            ));
        }
        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(Error::Config(
                "rate_limit.sweep_interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
