use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::relay::{ContentRelay, SweepReport};

/// What the sweeper is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Scanning,
}

/// Periodically removes expired entries and announces their removal.
///
/// Runs until a message arrives on (or the sender side drops) the shutdown
/// channel returned by [`ExpirySweeper::new`].
pub struct ExpirySweeper {
    relay: Arc<ContentRelay>,
    interval: Duration,
    scanning: AtomicBool,
    shutdown_rx: mpsc::Receiver<()>,
}

impl ExpirySweeper {
    /// Create a sweeper and the sender used to stop it.
    pub fn new(relay: Arc<ContentRelay>, interval: Duration) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let sweeper = Self {
            relay,
            interval,
            scanning: AtomicBool::new(false),
            shutdown_rx,
        };
        (sweeper, shutdown_tx)
    }

    pub fn state(&self) -> SweepState {
        if self.scanning.load(Ordering::Acquire) {
            SweepState::Scanning
        } else {
            SweepState::Idle
        }
    }

    /// Run one sweep against the relay's current time.
    pub fn tick(&self) -> SweepReport {
        self.scanning.store(true, Ordering::Release);
        let now = self.relay.clock().now();
        let report = self.relay.sweep_expired(now);
        self.relay.metrics().increment_sweeps();
        self.scanning.store(false, Ordering::Release);

        if report.removed.is_empty() {
            debug!("sweep found nothing to expire");
        } else {
            info!(removed = report.removed.len(), "expired entries swept");
        }
        if report.failed_deliveries > 0 {
            warn!(
                failed = report.failed_deliveries,
                "observers dropped while announcing expiry"
            );
        }
        report
    }

    /// Sweep on every interval tick until shut down.
    pub async fn run(&mut self) {
        info!(interval = ?self.interval, "expiry sweeper starting");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("expiry sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }

        info!("expiry sweeper stopped");
    }

    /// Move the sweeper onto its own task.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use ephemera_core::{Clock, HubEvent, ManualClock, SequentialIdGenerator};

    use super::*;
    use crate::observer::observer_channel;

    fn setup() -> (Arc<ManualClock>, Arc<ContentRelay>) {
        let clock = Arc::new(ManualClock::default());
        let relay = ContentRelay::builder()
            .clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .id_generator(Arc::new(SequentialIdGenerator::new("s")))
            .build();
        (clock, Arc::new(relay))
    }

    #[test]
    fn tick_removes_only_expired_entries() {
        let (clock, relay) = setup();
        let stale = relay.share_text("stale", false).unwrap();
        clock.advance(ChronoDuration::minutes(6));
        let fresh = relay.share_text("fresh", false).unwrap();
        clock.advance(ChronoDuration::minutes(5));

        let (sweeper, _tx) = ExpirySweeper::new(Arc::clone(&relay), Duration::from_secs(30));
        let report = sweeper.tick();
        assert_eq!(report.removed, vec![stale.id().clone()]);
        assert_eq!(sweeper.state(), SweepState::Idle);

        let listed: Vec<_> = relay.list().iter().map(|v| v.id().clone()).collect();
        assert_eq!(listed, vec![fresh.id().clone()]);
        assert_eq!(relay.metrics().snapshot().sweeps, 1);
    }

    #[test]
    fn repeated_ticks_are_idempotent() {
        let (clock, relay) = setup();
        relay.share_text("gone soon", false).unwrap();
        clock.advance(ChronoDuration::minutes(11));

        let (sweeper, _tx) = ExpirySweeper::new(Arc::clone(&relay), Duration::from_secs(30));
        assert_eq!(sweeper.tick().removed.len(), 1);
        assert!(sweeper.tick().removed.is_empty());
        assert_eq!(relay.store_len(), 0);
    }

    #[test]
    fn broken_observer_does_not_stop_the_tick() {
        let (clock, relay) = setup();
        let shared: Vec<_> = ["one", "two", "three"]
            .into_iter()
            .map(|text| relay.share_text(text, false).unwrap().id().clone())
            .collect();

        let (healthy_tx, mut healthy_rx) = observer_channel(64);
        relay.connect(Box::new(healthy_tx)).unwrap();
        let (dying_tx, dying_rx) = observer_channel(64);
        relay.connect(Box::new(dying_tx)).unwrap();
        drop(dying_rx);
        while healthy_rx.try_recv().is_ok() {}

        clock.advance(ChronoDuration::minutes(11));
        let (sweeper, _tx) = ExpirySweeper::new(Arc::clone(&relay), Duration::from_secs(30));
        let report = sweeper.tick();

        assert_eq!(report.removed, shared);
        assert!(report.failed_deliveries > 0);
        assert_eq!(relay.store_len(), 0);
        assert_eq!(relay.observer_count(), 1);

        let mut removed = Vec::new();
        while let Ok(event) = healthy_rx.try_recv() {
            if let HubEvent::ContentRemoved { id } = &*event {
                removed.push(id.clone());
            }
        }
        assert_eq!(removed, shared);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_sweeps_until_shutdown() {
        let (clock, relay) = setup();
        relay.share_text("expiring", false).unwrap();
        clock.advance(ChronoDuration::minutes(11));

        let (sweeper, shutdown_tx) =
            ExpirySweeper::new(Arc::clone(&relay), Duration::from_secs(30));
        let handle = sweeper.spawn();

        // The first tick fires immediately; give it a few intervals.
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(relay.store_len(), 0);
        assert!(relay.metrics().snapshot().sweeps >= 3);

        shutdown_tx.send(()).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_sender_stops_the_loop() {
        let (_clock, relay) = setup();
        let (sweeper, shutdown_tx) = ExpirySweeper::new(relay, Duration::from_secs(30));
        let handle = sweeper.spawn();
        drop(shutdown_tx);
        handle.await.unwrap();
    }
}
