pub mod hub;
pub mod metrics;
pub mod observer;
pub mod relay;
pub mod sweeper;

pub use hub::{BroadcastHub, FanOutReport};
pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use observer::{DeliveryError, ObserverId, ObserverSink, observer_channel};
pub use relay::{ContentRelay, RelayBuilder, SweepReport};
pub use sweeper::{ExpirySweeper, SweepState};
