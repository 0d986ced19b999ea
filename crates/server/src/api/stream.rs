//! SSE event streaming endpoint.
//!
//! `GET /api/events` registers the caller as an observer of the relay. The
//! first event is always `initial-snapshot`; after that the stream carries
//! `content-added`, `content-removed` and `client-count` in the order the
//! relay produced them.
//!
//! ## Resource controls
//!
//! - **Connection cap**: a global limit on concurrent observers (default 256)
//! - **Slow clients**: each observer has a bounded buffer; an observer that
//!   lets it fill up is dropped by the relay and its stream ends, so the
//!   client reconnects and receives a fresh snapshot

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use ephemera_core::HubEvent;
use ephemera_relay::{ContentRelay, ObserverId, observer_channel};

use super::AppState;
use crate::error::ServerError;

/// Tracks how many event streams are open.
///
/// Slots are taken before an observer is registered and released when the
/// stream is dropped.
pub struct ObserverLimiter {
    active: Arc<AtomicUsize>,
    max: usize,
}

impl ObserverLimiter {
    /// Create a limiter allowing at most `max` concurrent streams.
    pub fn new(max: usize) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max,
        }
    }

    /// Try to take a slot. Returns `None` if the limit is reached.
    pub fn try_acquire(&self) -> Option<ObserverSlot> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < self.max).then_some(current + 1)
            })
            .ok()
            .map(|_| ObserverSlot {
                active: Arc::clone(&self.active),
            })
    }

    /// Number of slots currently held.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

/// RAII guard that releases a limiter slot on drop.
pub struct ObserverSlot {
    active: Arc<AtomicUsize>,
}

impl Drop for ObserverSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Keeps an observer registered for as long as its stream is alive.
struct ObserverGuard {
    relay: Arc<ContentRelay>,
    id: ObserverId,
    _slot: ObserverSlot,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        if self.relay.disconnect(self.id) {
            debug!(observer = %self.id, "event stream closed");
        } else {
            debug!(observer = %self.id, "event stream closed after observer was dropped");
        }
    }
}

/// `GET /api/events` -- subscribe to content events via SSE.
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    summary = "Subscribe to content events",
    description = "Server-Sent Events stream. The first event is `initial-snapshot` with every live entry, followed by `content-added`, `content-removed` and `client-count` events.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream"),
        (status = 429, description = "Too many concurrent streams", body = super::schemas::ErrorResponse),
        (status = 500, description = "Stream could not be opened", body = super::schemas::ErrorResponse)
    )
)]
#[allow(clippy::unused_async)]
pub async fn events(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let slot = state.observers.try_acquire().ok_or_else(|| {
        warn!(
            active = state.observers.active(),
            "rejecting event stream, observer limit reached"
        );
        ServerError::TooManyObservers
    })?;

    let (tx, rx) = observer_channel(state.stream.observer_buffer);
    let id = state.relay.connect(Box::new(tx)).ok_or_else(|| {
        ServerError::Internal("observer could not receive the initial snapshot".into())
    })?;
    debug!(observer = %id, "event stream opened");

    let guard = ObserverGuard {
        relay: Arc::clone(&state.relay),
        id,
        _slot: slot,
    };

    Ok(Sse::new(make_event_stream(rx, guard)).keep_alive(
        KeepAlive::new()
            .interval(state.stream.keep_alive())
            .text("ping"),
    ))
}

/// Turn the observer's receiver into an SSE stream.
///
/// The guard is moved into the stream so it is dropped when the client
/// disconnects, deregistering the observer and releasing its slot.
fn make_event_stream(
    rx: mpsc::Receiver<Arc<HubEvent>>,
    guard: ObserverGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    ReceiverStream::new(rx).filter_map(move |event| {
        let _ = &guard;
        match serde_json::to_string(&*event) {
            Ok(json) => Some(Ok(Event::default().event(event.name()).data(json))),
            Err(e) => {
                warn!(error = %e, event = event.name(), "failed to serialize hub event");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_acquire_and_release() {
        let limiter = ObserverLimiter::new(2);
        let first = limiter.try_acquire();
        assert!(first.is_some(), "first acquire should succeed");
        let second = limiter.try_acquire();
        assert!(second.is_some(), "second acquire should succeed (limit=2)");
        assert!(
            limiter.try_acquire().is_none(),
            "third acquire should fail (limit=2)"
        );
        drop(first);
        assert_eq!(limiter.active(), 1);
        assert!(
            limiter.try_acquire().is_some(),
            "acquire after release should succeed"
        );
    }

    #[test]
    fn guard_disconnects_observer_and_frees_slot() {
        let relay = Arc::new(ContentRelay::builder().build());
        let limiter = ObserverLimiter::new(1);
        let slot = limiter.try_acquire().unwrap();

        let (tx, _rx) = observer_channel(8);
        let id = relay.connect(Box::new(tx)).unwrap();
        assert_eq!(relay.observer_count(), 1);

        drop(ObserverGuard {
            relay: Arc::clone(&relay),
            id,
            _slot: slot,
        });
        assert_eq!(relay.observer_count(), 0);
        assert_eq!(limiter.active(), 0);
    }

    #[tokio::test]
    async fn stream_emits_named_events() {
        let relay = Arc::new(ContentRelay::builder().build());
        let limiter = ObserverLimiter::new(1);
        let (tx, rx) = observer_channel(8);
        let id = relay.connect(Box::new(tx)).unwrap();
        let guard = ObserverGuard {
            relay: Arc::clone(&relay),
            id,
            _slot: limiter.try_acquire().unwrap(),
        };

        let stream = make_event_stream(rx, guard);
        tokio::pin!(stream);
        // Snapshot and client-count are already queued.
        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_some());

        relay.share_text("hello", false).unwrap();
        assert!(stream.next().await.is_some());
    }
}
