//! Health checks and service statistics
//!
//! Backs the `/health` and `/stats` endpoints and the `--health-check` CLI
//! mode.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Error message if the component could not be read
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Registry and tracker counts for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceStats {
    pub active_rooms: usize,
    pub members_in_rooms: usize,
    pub rooms_created: u64,
    pub rooms_pruned: u64,
    pub host_migrations: u64,
    /// Users with a recorded location
    pub tracked_locations: usize,
    /// Users with at least one recent partner
    pub recency_users: usize,
    pub uptime_seconds: i64,
}

impl HealthCheck {
    /// Perform a full health check of the service
    pub async fn check(app_state: &AppState) -> Result<Self> {
        let mut checks = Vec::new();

        checks.push(Self::check_service_running(app_state).await);
        checks.push(Self::check_registry(app_state));
        checks.push(Self::check_trackers(app_state));

        let status = overall_status(&checks);
        let stats = Self::gather_service_stats(app_state);

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Liveness: the server loop is accepting requests
    pub async fn liveness_check(app_state: &AppState) -> HealthStatus {
        if app_state.is_running().await {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Degraded,
                Some("HTTP server is not serving".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_registry(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.processor().state().registry.stats() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Room registry check failed: {}", e);
                (HealthStatus::Unhealthy, Some(e.to_string()))
            }
        };

        ComponentCheck {
            name: "room_registry".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_trackers(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();
        let state = app_state.processor().state();

        let result = state
            .locations
            .count()
            .and_then(|_| state.recency.tracked_users());
        let (status, message) = match result {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Tracker check failed: {}", e);
                (HealthStatus::Unhealthy, Some(e.to_string()))
            }
        };

        ComponentCheck {
            name: "trackers".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Gather current service statistics, zeroing anything unreadable
    pub fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let state = app_state.processor().state();
        let mut stats = ServiceStats {
            uptime_seconds: app_state.uptime().num_seconds(),
            ..ServiceStats::default()
        };

        match state.registry.stats() {
            Ok(registry) => {
                stats.active_rooms = registry.active_rooms;
                stats.members_in_rooms = registry.members_in_rooms;
                stats.rooms_created = registry.rooms_created;
                stats.rooms_pruned = registry.rooms_pruned;
                stats.host_migrations = registry.host_migrations;
            }
            Err(e) => debug!("Failed to read registry stats: {}", e),
        }
        stats.tracked_locations = state.locations.count().unwrap_or_default();
        stats.recency_users = state.recency.tracked_users().unwrap_or_default();

        stats
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}

fn overall_status(checks: &[ComponentCheck]) -> HealthStatus {
    if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
