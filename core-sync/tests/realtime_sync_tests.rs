//! Integration tests for the realtime apply loop.
//!
//! Drives `RealtimeTrackSync` through a channel-backed fake change feed and
//! verifies the store reconciliation and cascade invalidation contracts.

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::notify::{Notice, Notifier};
use bridge_traits::querycache::{QueryCache, QueryKey};
use bridge_traits::realtime::{ChangeFeed, ChangeFilter, ChangeSubscription, TrackChangeRecord};
use chrono::Utc;
use core_library::models::{TrackId, TrackStatus};
use core_library::store::TrackStore;
use core_runtime::config::SyncSettings;
use core_runtime::events::{EventBus, StudioEvent, TrackEvent};
use core_sync::realtime::RealtimeTrackSync;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct ChannelFeed {
    rx: Mutex<Option<mpsc::Receiver<TrackChangeRecord>>>,
    seen_filter: Mutex<Option<String>>,
}

impl ChannelFeed {
    fn new() -> (Arc<Self>, mpsc::Sender<TrackChangeRecord>) {
        let (tx, rx) = mpsc::channel(16);
        (
            Arc::new(Self {
                rx: Mutex::new(Some(rx)),
                seen_filter: Mutex::new(None),
            }),
            tx,
        )
    }
}

#[async_trait::async_trait]
impl ChangeFeed for ChannelFeed {
    async fn subscribe(&self, filter: ChangeFilter) -> BridgeResult<Box<dyn ChangeSubscription>> {
        *self.seen_filter.lock() = Some(filter.user_id);
        let rx = self
            .rx
            .lock()
            .take()
            .ok_or_else(|| BridgeError::NotAvailable("already subscribed".to_string()))?;
        Ok(Box::new(ChannelSubscription { rx }))
    }
}

struct ChannelSubscription {
    rx: mpsc::Receiver<TrackChangeRecord>,
}

#[async_trait::async_trait]
impl ChangeSubscription for ChannelSubscription {
    async fn next(&mut self) -> Option<TrackChangeRecord> {
        self.rx.recv().await
    }

    async fn close(&mut self) -> BridgeResult<()> {
        self.rx.close();
        Ok(())
    }
}

#[derive(Default)]
struct RecordingQueryCache {
    keys: Mutex<Vec<QueryKey>>,
}

#[async_trait::async_trait]
impl QueryCache for RecordingQueryCache {
    async fn invalidate(&self, key: QueryKey) -> BridgeResult<()> {
        self.keys.lock().push(key);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    successes: Mutex<Vec<Notice>>,
    errors: Mutex<Vec<Notice>>,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn success(&self, notice: Notice) -> BridgeResult<()> {
        self.successes.lock().push(notice);
        Ok(())
    }

    async fn error(&self, notice: Notice) -> BridgeResult<()> {
        self.errors.lock().push(notice);
        Ok(())
    }
}

struct Harness {
    sync: RealtimeTrackSync,
    tx: mpsc::Sender<TrackChangeRecord>,
    feed: Arc<ChannelFeed>,
    store: Arc<TrackStore>,
    query_cache: Arc<RecordingQueryCache>,
    notifier: Arc<RecordingNotifier>,
    events: EventBus,
}

fn harness() -> Harness {
    let (feed, tx) = ChannelFeed::new();
    let store = Arc::new(TrackStore::new());
    let query_cache = Arc::new(RecordingQueryCache::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let events = EventBus::new(64);

    let sync = RealtimeTrackSync::new(
        feed.clone(),
        store.clone(),
        query_cache.clone(),
        notifier.clone(),
        events.clone(),
        SyncSettings::default(),
    );

    Harness {
        sync,
        tx,
        feed,
        store,
        query_cache,
        notifier,
        events,
    }
}

fn record(id: &TrackId, status: &str, title: &str) -> TrackChangeRecord {
    TrackChangeRecord {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        title: title.to_string(),
        status: status.to_string(),
        audio_url: (status == "completed").then(|| "https://cdn.example/a.mp3".to_string()),
        cover_url: None,
        duration_secs: None,
        lyrics: None,
        error_message: (status == "failed").then(|| "provider quota exceeded".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within timeout");
}

#[tokio::test]
async fn subscription_is_scoped_to_the_user() {
    let h = harness();
    h.sync.start("user-42").await.unwrap();
    assert_eq!(h.feed.seen_filter.lock().as_deref(), Some("user-42"));
    assert!(h.sync.is_running());
}

#[tokio::test]
async fn upsert_appends_then_replaces_by_id() {
    let h = harness();
    h.sync.start("user-1").await.unwrap();
    let id = TrackId::new();

    h.tx.send(record(&id, "processing", "Draft")).await.unwrap();
    let store = h.store.clone();
    wait_until(move || store.len() == 1).await;

    h.tx.send(record(&id, "completed", "Final Mix")).await.unwrap();
    let store = h.store.clone();
    wait_until(move || {
        store
            .get(&id)
            .is_some_and(|t| t.status == TrackStatus::Completed)
    })
    .await;

    // Replaced in place, never duplicated.
    assert_eq!(h.store.len(), 1);
    let latest = h.store.get(&id).unwrap();
    assert_eq!(latest.title, "Final Mix");
    assert_eq!(latest.audio_url.as_deref(), Some("https://cdn.example/a.mp3"));
    assert_eq!(h.store.all()[0], latest);
}

#[tokio::test]
async fn completion_cascades_derived_invalidation() {
    let h = harness();
    h.sync.start("user-1").await.unwrap();
    let id = TrackId::new();

    h.tx.send(record(&id, "processing", "t")).await.unwrap();
    let store = h.store.clone();
    wait_until(move || store.len() == 1).await;
    assert!(h.query_cache.keys.lock().is_empty());

    h.tx.send(record(&id, "completed", "t")).await.unwrap();
    let cache = h.query_cache.clone();
    wait_until(move || cache.keys.lock().len() == 2).await;

    let keys = h.query_cache.keys.lock().clone();
    assert!(keys.contains(&QueryKey::TrackVersions(id.to_string())));
    assert!(keys.contains(&QueryKey::TrackStems(id.to_string())));
}

#[tokio::test]
async fn completion_notifies_once_per_transition() {
    let h = harness();
    let mut subscriber = h.events.subscribe();
    h.sync.start("user-1").await.unwrap();
    let id = TrackId::new();

    h.tx.send(record(&id, "completed", "Neon Skyline")).await.unwrap();
    let notifier = h.notifier.clone();
    wait_until(move || notifier.successes.lock().len() == 1).await;

    // A second completed record (e.g. a title edit) re-invalidates but
    // does not re-announce.
    h.tx.send(record(&id, "completed", "Neon Skyline (edit)"))
        .await
        .unwrap();
    let cache = h.query_cache.clone();
    wait_until(move || cache.keys.lock().len() == 4).await;
    assert_eq!(h.notifier.successes.lock().len(), 1);

    let notice = &h.notifier.successes.lock()[0];
    assert_eq!(notice.title, "Track ready");
    assert!(notice.body.as_deref().unwrap().contains("Neon Skyline"));

    loop {
        if let StudioEvent::Track(TrackEvent::Completed { track_id, title }) =
            subscriber.recv().await.unwrap()
        {
            assert_eq!(track_id, id.to_string());
            assert_eq!(title, "Neon Skyline");
            break;
        }
    }
}

#[tokio::test]
async fn failure_surfaces_error_notice() {
    let h = harness();
    h.sync.start("user-1").await.unwrap();
    let id = TrackId::new();

    h.tx.send(record(&id, "failed", "Broken")).await.unwrap();
    let notifier = h.notifier.clone();
    wait_until(move || notifier.errors.lock().len() == 1).await;

    let notice = &h.notifier.errors.lock()[0];
    assert_eq!(notice.title, "Generation failed");
    assert_eq!(notice.body.as_deref(), Some("provider quota exceeded"));
    assert!(h.notifier.successes.lock().is_empty());
}

#[tokio::test]
async fn malformed_records_are_skipped_not_fatal() {
    let h = harness();
    h.sync.start("user-1").await.unwrap();
    let id = TrackId::new();

    h.tx.send(record(&id, "exploded", "Bad")).await.unwrap();
    let good = TrackId::new();
    h.tx.send(record(&good, "processing", "Good")).await.unwrap();

    let store = h.store.clone();
    wait_until(move || store.len() == 1).await;
    assert!(h.store.get(&good).is_some());
    assert!(h.store.get(&id).is_none());
}

#[tokio::test]
async fn stop_halts_application() {
    let h = harness();
    h.sync.start("user-1").await.unwrap();
    h.sync.stop();
    assert!(!h.sync.is_running());

    let id = TrackId::new();
    // The send may fail once the receiver is dropped; either way nothing
    // must reach the store.
    let _ = h.tx.send(record(&id, "processing", "t")).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn start_reports_stale_processing_tracks() {
    let h = harness();
    let id = TrackId::new();
    let mut stuck =
        core_library::models::Track::from_change_record(&record(&id, "processing", "Stuck"))
            .unwrap();
    stuck.updated_at = Utc::now() - chrono::Duration::hours(1);
    h.store.prime(vec![stuck]);

    let mut subscriber = h.events.subscribe();
    h.sync.start("user-1").await.unwrap();

    loop {
        if let StudioEvent::Track(TrackEvent::StaleDetected { track_id }) =
            subscriber.recv().await.unwrap()
        {
            assert_eq!(track_id, id.to_string());
            break;
        }
    }
}
