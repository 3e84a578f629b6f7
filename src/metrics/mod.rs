//! Metrics for the matchroom service
//!
//! Prometheus collectors for command processing, the room registry and
//! the trackers; exposed over HTTP by the service layer.

pub mod collector;

pub use collector::{CommandMetrics, MetricsCollector, MetricsTimer, RoomMetrics};
