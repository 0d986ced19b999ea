use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use ephemera_core::HubEvent;

/// Handle identifying a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Why an event could not be handed to an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The receiving side has gone away.
    #[error("observer channel closed")]
    Closed,
    /// The observer is not draining its buffer fast enough.
    #[error("observer buffer full")]
    Full,
}

/// The transport side of a connected observer.
///
/// `deliver` must not block: the hub calls it while holding its registry
/// lock.
pub trait ObserverSink: Send + Sync {
    fn deliver(&self, event: &Arc<HubEvent>) -> Result<(), DeliveryError>;
}

impl ObserverSink for mpsc::Sender<Arc<HubEvent>> {
    fn deliver(&self, event: &Arc<HubEvent>) -> Result<(), DeliveryError> {
        self.try_send(Arc::clone(event)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Create a bounded channel suitable for registering as an observer.
pub fn observer_channel(
    capacity: usize,
) -> (mpsc::Sender<Arc<HubEvent>>, mpsc::Receiver<Arc<HubEvent>>) {
    mpsc::channel(capacity.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_reports_full_and_closed() {
        let (tx, rx) = observer_channel(1);
        let event = Arc::new(HubEvent::ClientCount { count: 1 });

        assert_eq!(tx.deliver(&event), Ok(()));
        assert_eq!(tx.deliver(&event), Err(DeliveryError::Full));

        drop(rx);
        assert_eq!(tx.deliver(&event), Err(DeliveryError::Closed));
    }
}
