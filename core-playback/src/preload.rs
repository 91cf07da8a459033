//! Speculative audio preloading.
//!
//! Warms host media buffers for tracks adjacent to the playback position so
//! next/previous feel instant. Tracking is keyed by URL and idempotent;
//! every window sync releases handles that fell out of the relevant range,
//! bounding memory and network usage. Preloading is purely an optimization:
//! failures are debug-logged and the handle dropped, nothing is surfaced.

use bridge_traits::playback::{AudioSourceLoader, PreloadHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::debug;

/// Shape of the index window considered worth preloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadWindow {
    /// Upcoming tracks only: `[current+1, current+count]`.
    Ahead { count: usize },
    /// Both directions: `[current-radius, current+radius]`.
    Around { radius: usize },
}

impl PreloadWindow {
    /// Indices inside the window, clamped to `0..len`. An empty range is
    /// returned as `1..=0`.
    fn relevant(&self, current: usize, len: usize) -> RangeInclusive<usize> {
        if len == 0 {
            return 1..=0;
        }
        let last = len - 1;
        match *self {
            PreloadWindow::Ahead { count } => {
                let start = current.saturating_add(1);
                if start > last || count == 0 {
                    return 1..=0;
                }
                start..=current.saturating_add(count).min(last)
            }
            PreloadWindow::Around { radius } => {
                current.saturating_sub(radius)..=current.saturating_add(radius).min(last)
            }
        }
    }
}

/// Window-driven preloader over a host [`AudioSourceLoader`].
pub struct AudioPreloader {
    loader: Arc<dyn AudioSourceLoader>,
    window: PreloadWindow,
    tracked: Mutex<HashMap<String, PreloadHandle>>,
}

impl AudioPreloader {
    /// Preloader warming the next `count` sources after the current one.
    pub fn look_ahead(loader: Arc<dyn AudioSourceLoader>, count: usize) -> Self {
        Self::with_window(loader, PreloadWindow::Ahead { count })
    }

    /// Prefetcher warming a symmetric window around the current position.
    pub fn around(loader: Arc<dyn AudioSourceLoader>, radius: usize) -> Self {
        Self::with_window(loader, PreloadWindow::Around { radius })
    }

    pub fn with_window(loader: Arc<dyn AudioSourceLoader>, window: PreloadWindow) -> Self {
        Self {
            loader,
            window,
            tracked: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile tracked handles with the window around `current_index`.
    ///
    /// Call on every dependency change (track list, current position).
    /// Sources already tracked are skipped; sources outside the window are
    /// released.
    pub async fn sync(&self, urls: &[String], current_index: usize) {
        let relevant = self.window.relevant(current_index, urls.len());
        let wanted: Vec<String> = relevant
            .filter_map(|i| urls.get(i))
            .filter(|url| !url.is_empty())
            .cloned()
            .collect();

        let (to_release, to_load) = {
            let tracked = self.tracked.lock();
            let to_release: Vec<(String, PreloadHandle)> = tracked
                .iter()
                .filter(|(url, _)| !wanted.contains(*url))
                .map(|(url, handle)| (url.clone(), handle.clone()))
                .collect();
            let to_load: Vec<String> = wanted
                .iter()
                .filter(|url| !tracked.contains_key(*url))
                .cloned()
                .collect();
            (to_release, to_load)
        };

        for (url, handle) in to_release {
            self.tracked.lock().remove(&url);
            if let Err(e) = self.loader.release(handle).await {
                debug!(url, error = %e, "failed to release preload handle");
            }
        }

        for url in to_load {
            match self.loader.begin_preload(&url).await {
                Ok(handle) => {
                    debug!(url, "preload started");
                    self.tracked.lock().insert(url, handle);
                }
                Err(e) => {
                    // Preloading is best-effort; a bad URL or decode error
                    // must not disturb playback.
                    debug!(url, error = %e, "preload failed, dropping source");
                }
            }
        }
    }

    /// Release every tracked handle. Call on teardown.
    pub async fn shutdown(&self) {
        let handles: Vec<PreloadHandle> = {
            let mut tracked = self.tracked.lock();
            tracked.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            let url = handle.url().to_string();
            if let Err(e) = self.loader.release(handle).await {
                debug!(url, error = %e, "failed to release preload handle on shutdown");
            }
        }
    }

    /// Number of sources currently being preloaded.
    pub fn tracked_count(&self) -> usize {
        self.tracked.lock().len()
    }

    /// Whether `url` is currently tracked.
    pub fn is_tracked(&self, url: &str) -> bool {
        self.tracked.lock().contains_key(url)
    }
}
