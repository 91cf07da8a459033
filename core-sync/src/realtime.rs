//! # Realtime Track Sync
//!
//! Keeps the local track store consistent with the backend's push-based
//! change feed.
//!
//! ## Workflow
//!
//! 1. `start(user_id)` opens a user-scoped subscription on the change feed
//!    and spawns the apply loop
//! 2. Each incoming record is upserted by id into the store (collection slot
//!    patched in place, single-track entry overwritten — server wins)
//! 3. Records reporting `completed` additionally invalidate the version-list
//!    and stem-list read-models for that track, since completion is when a
//!    track gains authoritative version/stem data
//! 4. Completion and failure transitions surface user notifications and
//!    events; other transitions stay silent beyond the upsert
//!
//! Records are applied strictly in arrival order. Apply failures are logged
//! and never propagate back into the feed; a malformed record is skipped and
//! the loop keeps going.

use crate::error::Result;
use bridge_traits::notify::{Notice, Notifier};
use bridge_traits::querycache::{QueryCache, QueryKey};
use bridge_traits::realtime::{ChangeFeed, ChangeFilter, TrackChangeRecord};
use core_library::models::{Track, TrackStatus};
use core_library::store::TrackStore;
use core_runtime::config::SyncSettings;
use core_runtime::events::{EventBus, StudioEvent, TrackEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Coordinator owning the realtime subscription and apply loop.
pub struct RealtimeTrackSync {
    feed: Arc<dyn ChangeFeed>,
    store: Arc<TrackStore>,
    query_cache: Arc<dyn QueryCache>,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
    settings: SyncSettings,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeTrackSync {
    pub fn new(
        feed: Arc<dyn ChangeFeed>,
        store: Arc<TrackStore>,
        query_cache: Arc<dyn QueryCache>,
        notifier: Arc<dyn Notifier>,
        events: EventBus,
        settings: SyncSettings,
    ) -> Self {
        Self {
            feed,
            store,
            query_cache,
            notifier,
            events,
            settings,
            worker: Mutex::new(None),
        }
    }

    /// Subscribe to the user's track changes and start applying them.
    ///
    /// Replaces any previous subscription. Also flags tracks that have been
    /// stuck in `processing` beyond the staleness threshold, since those
    /// most likely missed their completion event while disconnected.
    #[instrument(skip(self))]
    pub async fn start(&self, user_id: &str) -> Result<()> {
        self.stop();

        for track in self
            .store
            .stale_processing(self.settings.stale_processing_threshold())
        {
            warn!(track_id = %track.id, title = %track.title, "track stuck in processing");
            self.events
                .emit(StudioEvent::Track(TrackEvent::StaleDetected {
                    track_id: track.id.to_string(),
                }))
                .ok();
        }

        let mut subscription = self
            .feed
            .subscribe(ChangeFilter::for_user(user_id))
            .await?;
        info!(user_id, "realtime track sync subscribed");

        let store = Arc::clone(&self.store);
        let query_cache = Arc::clone(&self.query_cache);
        let notifier = Arc::clone(&self.notifier);
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            while let Some(record) = subscription.next().await {
                Self::apply_change(&store, &query_cache, &notifier, &events, record).await;
            }
            debug!("change feed closed, apply loop exiting");
        });
        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Tear down the subscription, e.g. on sign-out.
    ///
    /// Aborting the apply loop drops the subscription, which closes it on
    /// the transport side.
    pub fn stop(&self) {
        if let Some(handle) = self.worker.lock().take() {
            handle.abort();
            debug!("realtime track sync stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Apply one change record. Never fails upward: malformed records are
    /// skipped, bridge failures during cascade invalidation are logged.
    async fn apply_change(
        store: &TrackStore,
        query_cache: &Arc<dyn QueryCache>,
        notifier: &Arc<dyn Notifier>,
        events: &EventBus,
        record: TrackChangeRecord,
    ) {
        let track = match Track::from_change_record(&record) {
            Ok(track) => track,
            Err(e) => {
                warn!(record_id = %record.id, error = %e, "skipping malformed change record");
                return;
            }
        };

        debug!(track_id = %track.id, status = %track.status, "applying track change");

        let previous = store.get(&track.id);
        store.upsert(track.clone());

        match track.status {
            TrackStatus::Completed => {
                // Completion changes the authoritative version/stem data;
                // derived read-models must be refetched.
                let track_key = track.id.to_string();
                for key in [
                    QueryKey::TrackVersions(track_key.clone()),
                    QueryKey::TrackStems(track_key),
                ] {
                    if let Err(e) = query_cache.invalidate(key.clone()).await {
                        warn!(%key, error = %e, "derived cache invalidation failed");
                    }
                }

                let newly_completed =
                    previous.map_or(true, |p| p.status != TrackStatus::Completed);
                if newly_completed {
                    info!(track_id = %track.id, title = %track.title, "track completed");
                    notifier
                        .success(
                            Notice::new("Track ready")
                                .with_body(format!("\"{}\" finished generating", track.title)),
                        )
                        .await
                        .ok();
                    events
                        .emit(StudioEvent::Track(TrackEvent::Completed {
                            track_id: track.id.to_string(),
                            title: track.title.clone(),
                        }))
                        .ok();
                }
            }
            TrackStatus::Failed => {
                let newly_failed = previous.map_or(true, |p| p.status != TrackStatus::Failed);
                if newly_failed {
                    warn!(
                        track_id = %track.id,
                        error = track.error_message.as_deref().unwrap_or("unknown"),
                        "track generation failed"
                    );
                    notifier
                        .error(Notice::new("Generation failed").with_body(
                            track
                                .error_message
                                .clone()
                                .unwrap_or_else(|| "The track could not be created".to_string()),
                        ))
                        .await
                        .ok();
                    events
                        .emit(StudioEvent::Track(TrackEvent::Failed {
                            track_id: track.id.to_string(),
                            message: track.error_message.clone(),
                        }))
                        .ok();
                }
            }
            TrackStatus::Pending | TrackStatus::Processing => {
                // Cheap progress updates; the upsert above is all they need.
                events
                    .emit(StudioEvent::Track(TrackEvent::Updated {
                        track_id: track.id.to_string(),
                        status: track.status.to_string(),
                    }))
                    .ok();
            }
        }
    }
}

impl Drop for RealtimeTrackSync {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.lock().take() {
            handle.abort();
        }
    }
}
