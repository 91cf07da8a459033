//! # Event Bus System
//!
//! Decoupled communication between core modules over `tokio::sync::broadcast`.
//!
//! The sync layer publishes track lifecycle events as it applies realtime
//! records; the playback layer publishes version-switch and navigation
//! events. Host shells subscribe to drive badges, progress indicators and
//! anything else that should react without being wired to the producer.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, StudioEvent, TrackEvent};
//!
//! let bus = EventBus::new(100);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(StudioEvent::Track(TrackEvent::Completed {
//!     track_id: "track-123".to_string(),
//!     title: "Neon Skyline".to_string(),
//! }))
//! .ok();
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` semantics apply:
//!
//! - `RecvError::Lagged(n)`: the subscriber missed `n` events. Non-fatal;
//!   keep receiving.
//! - `RecvError::Closed`: all senders dropped; treat as shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum StudioEvent {
    /// Track lifecycle events from the sync layer
    Track(TrackEvent),
    /// Player-side events from navigation and version switching
    Player(PlayerEvent),
}

impl StudioEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            StudioEvent::Track(e) => e.description(),
            StudioEvent::Player(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            StudioEvent::Track(TrackEvent::Failed { .. }) => EventSeverity::Error,
            StudioEvent::Track(TrackEvent::Completed { .. }) => EventSeverity::Info,
            StudioEvent::Track(TrackEvent::StaleDetected { .. }) => EventSeverity::Warning,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Events describing the generation lifecycle of tracks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum TrackEvent {
    /// Generation finished and the track gained playable audio.
    Completed {
        /// The completed track id.
        track_id: String,
        /// Track title for display surfaces.
        title: String,
    },
    /// Generation failed.
    Failed {
        /// The failed track id.
        track_id: String,
        /// Provider-reported error message, when present.
        message: Option<String>,
    },
    /// A non-terminal status/field update was applied.
    Updated {
        /// The updated track id.
        track_id: String,
        /// New status string (`pending`, `processing`, ...).
        status: String,
    },
    /// A track has sat in `processing` beyond the staleness threshold.
    StaleDetected {
        /// The stuck track id.
        track_id: String,
    },
}

impl TrackEvent {
    fn description(&self) -> &str {
        match self {
            TrackEvent::Completed { .. } => "Track generation completed",
            TrackEvent::Failed { .. } => "Track generation failed",
            TrackEvent::Updated { .. } => "Track updated",
            TrackEvent::StaleDetected { .. } => "Stale processing track detected",
        }
    }
}

/// Events produced by the player coordination layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlayerEvent {
    /// A different version of the current track was selected.
    VersionSwitched {
        /// The logical track id.
        track_id: String,
        /// 1-based number of the newly selected version.
        version_number: u32,
    },
    /// Back navigation restarted the current track from zero.
    Restarted {
        /// The restarted track id.
        track_id: String,
    },
    /// Navigation moved to a different track in the queue.
    TrackChanged {
        /// The newly current track id.
        track_id: String,
    },
}

impl PlayerEvent {
    fn description(&self) -> &str {
        match self {
            PlayerEvent::VersionSwitched { .. } => "Version switched",
            PlayerEvent::Restarted { .. } => "Track restarted",
            PlayerEvent::TrackChanged { .. } => "Track changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally: multiple producers (clone the
/// bus), independent consumers (each `subscribe()` creates a receiver),
/// non-blocking sends, and lag detection for slow subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StudioEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are none.
    pub fn emit(&self, event: StudioEvent) -> Result<usize, SendError<StudioEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all future events.
    pub fn subscribe(&self) -> Receiver<StudioEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&StudioEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` wrapper with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, StudioEvent};
///
/// let bus = EventBus::new(100);
/// let mut track_stream = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, StudioEvent::Track(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<StudioEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<StudioEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter; only matching events are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&StudioEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event passing the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` when the subscriber fell behind by `n` events;
    /// `RecvError::Closed` when all senders are gone.
    pub async fn recv(&mut self) -> Result<StudioEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(id: &str) -> StudioEvent {
        StudioEvent::Track(TrackEvent::Completed {
            track_id: id.to_string(),
            title: "t".to_string(),
        })
    }

    #[tokio::test]
    async fn emit_reaches_all_subscribers() {
        let bus = EventBus::new(16);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(completed("t1")).unwrap();
        assert_eq!(a.recv().await.unwrap(), completed("t1"));
        assert_eq!(b.recv().await.unwrap(), completed("t1"));
    }

    #[test]
    fn emit_without_subscribers_errors() {
        let bus = EventBus::new(16);
        assert!(bus.emit(completed("t1")).is_err());
    }

    #[tokio::test]
    async fn stream_filter_skips_non_matching() {
        let bus = EventBus::new(16);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|e| matches!(e, StudioEvent::Player(_)));

        bus.emit(completed("t1")).unwrap();
        let player_event = StudioEvent::Player(PlayerEvent::Restarted {
            track_id: "t1".to_string(),
        });
        bus.emit(player_event.clone()).unwrap();

        assert_eq!(stream.recv().await.unwrap(), player_event);
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(
            StudioEvent::Track(TrackEvent::Failed {
                track_id: "t".into(),
                message: None
            })
            .severity(),
            EventSeverity::Error
        );
        assert_eq!(completed("t").severity(), EventSeverity::Info);
    }

    #[test]
    fn events_serialize_with_tags() {
        let json = serde_json::to_string(&completed("t1")).unwrap();
        assert!(json.contains("\"type\":\"Track\""));
        assert!(json.contains("\"event\":\"Completed\""));
    }
}
