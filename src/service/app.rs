//! Main application state and service coordination
//!
//! `AppState` wires the registry, trackers, collaborators and metrics together
//! from an `AppConfig` and runs the HTTP server until shutdown is requested.

use crate::config::AppConfig;
use crate::identity::{IdentityResolver, InMemoryDirectory, InMemoryHeartbeatStore};
use crate::metrics::MetricsCollector;
use crate::room::{RoomRegistry, StaticSlotProvider};
use crate::service::http;
use crate::service::processor::{CommandProcessor, MatchState};
use crate::tracking::{LocationTracker, RecencyTracker};
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::info;

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("HTTP server error: {message}")]
    Server { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    config: AppConfig,

    /// Command execution against the shared registry and trackers
    processor: Arc<CommandProcessor>,

    /// User accounts and session tokens
    directory: Arc<InMemoryDirectory>,

    heartbeats: Arc<InMemoryHeartbeatStore>,

    metrics: Arc<MetricsCollector>,

    started_at: DateTime<Utc>,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing matchroom service");
        info!(
            "Configuration: service={}, bind={}, match_path={}",
            config.service.name,
            config.bind_address(),
            config.service.match_path
        );

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let directory = Arc::new(InMemoryDirectory::with_seed_users(&config.users).map_err(
            |e| ServiceError::Initialization {
                message: format!("Failed to seed user directory: {}", e),
            },
        )?);
        info!("Seeded {} user(s) into the directory", config.users.len());

        let heartbeats = Arc::new(InMemoryHeartbeatStore::new());
        let processor = Self::initialize_matchmaking(&config, &directory, &heartbeats, &metrics)?;

        Ok(Self {
            config,
            processor,
            directory,
            heartbeats,
            metrics,
            started_at: Utc::now(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    fn initialize_matchmaking(
        config: &AppConfig,
        directory: &Arc<InMemoryDirectory>,
        heartbeats: &Arc<InMemoryHeartbeatStore>,
        metrics: &Arc<MetricsCollector>,
    ) -> Result<Arc<CommandProcessor>, ServiceError> {
        let slot_provider =
            StaticSlotProvider::from_settings(&config.matchmaking).map_err(|e| {
                ServiceError::Configuration {
                    message: e.to_string(),
                }
            })?;

        let state = MatchState {
            registry: RoomRegistry::new(Arc::new(slot_provider)),
            locations: Arc::new(LocationTracker::new()),
            recency: Arc::new(RecencyTracker::new(config.matchmaking.recency_capacity)),
        };

        let processor = CommandProcessor::new(
            state,
            directory.clone(),
            heartbeats.clone(),
            metrics.clone(),
        );

        Ok(Arc::new(processor))
    }

    /// Serve HTTP on the configured address until `shutdown` resolves
    pub async fn serve<F>(self: Arc<Self>, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ServiceError::Server {
                message: format!("Failed to bind {}: {}", address, e),
            })?;

        info!("HTTP server listening on http://{}", address);
        self.serve_on(listener, shutdown).await
    }

    /// Serve HTTP on an already bound listener until `shutdown` resolves
    pub async fn serve_on<F>(
        self: Arc<Self>,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = http::router(self.clone());
        *self.is_running.write().await = true;

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServiceError::Server {
                message: e.to_string(),
            });

        *self.is_running.write().await = false;
        self.log_final_stats();
        result
    }

    fn log_final_stats(&self) {
        match self.processor.state().registry.stats() {
            Ok(stats) => info!("Final registry statistics: {:?}", stats),
            Err(e) => info!("Final registry statistics unavailable: {}", e),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if the HTTP server is serving
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn processor(&self) -> &Arc<CommandProcessor> {
        &self.processor
    }

    pub fn identity(&self) -> Arc<dyn IdentityResolver> {
        self.directory.clone()
    }

    /// Directory backing authentication and username lookups
    pub fn directory(&self) -> Arc<InMemoryDirectory> {
        self.directory.clone()
    }

    pub fn heartbeats(&self) -> Arc<InMemoryHeartbeatStore> {
        self.heartbeats.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn uptime(&self) -> Duration {
        Utc::now() - self.started_at
    }
}
