//! Per-user bookkeeping consulted by the best-room search
//!
//! Both trackers live for the lifetime of the process and are shared between
//! concurrent command executions.

pub mod location;
pub mod recency;

pub use location::LocationTracker;
pub use recency::RecencyTracker;
