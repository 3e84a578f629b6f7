//! Service layer for the matchroom service
//!
//! This module contains the command processor, the HTTP surface and the
//! application state that wires them to configuration.

pub mod app;
pub mod health;
pub mod http;
pub mod processor;

pub use app::{AppState, ServiceError};
pub use health::{HealthCheck, HealthStatus, ServiceStats};
pub use http::router;
pub use processor::{CommandProcessor, MatchState};
