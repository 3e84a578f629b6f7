//! Metrics collection using Prometheus

use crate::room::RegistryStats;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,
    command_metrics: CommandMetrics,
    room_metrics: RoomMetrics,
}

/// Command processing metrics
#[derive(Clone)]
pub struct CommandMetrics {
    /// Commands processed by kind and resulting status code
    pub commands_total: IntCounterVec,

    /// Time spent processing a command, heartbeat included
    pub command_duration: Histogram,

    /// Bodies that could not be decoded
    pub parse_failures_total: IntCounter,

    /// Best-room searches by outcome (found, not_found, skipped)
    pub room_searches_total: IntCounterVec,
}

/// Room registry and tracker metrics
#[derive(Clone)]
pub struct RoomMetrics {
    pub rooms_created_total: IntCounter,
    pub active_rooms: IntGauge,
    pub members_in_rooms: IntGauge,
    /// Rooms whose control passed to another member since startup
    pub host_migrations: IntGauge,
    pub tracked_locations: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let command_metrics = CommandMetrics::new(&registry)?;
        let room_metrics = RoomMetrics::new(&registry)?;

        Ok(Self {
            registry,
            command_metrics,
            room_metrics,
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn commands(&self) -> &CommandMetrics {
        &self.command_metrics
    }

    pub fn rooms(&self) -> &RoomMetrics {
        &self.room_metrics
    }

    /// Record a processed command
    pub fn record_command(&self, kind: &str, status_code: u16, duration: Duration) {
        self.command_metrics
            .commands_total
            .with_label_values(&[kind, &status_code.to_string()])
            .inc();
        self.command_metrics
            .command_duration
            .observe(duration.as_secs_f64());
    }

    pub fn record_parse_failure(&self) {
        self.command_metrics.parse_failures_total.inc();
    }

    pub fn record_room_search(&self, outcome: &str) {
        self.command_metrics
            .room_searches_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn record_room_created(&self) {
        self.room_metrics.rooms_created_total.inc();
    }

    /// Mirror the registry's current gauges
    pub fn update_from_registry_stats(&self, stats: &RegistryStats) {
        self.room_metrics.active_rooms.set(stats.active_rooms as i64);
        self.room_metrics
            .members_in_rooms
            .set(stats.members_in_rooms as i64);
        self.room_metrics
            .host_migrations
            .set(stats.host_migrations as i64);
    }

    pub fn update_tracked_locations(&self, count: usize) {
        self.room_metrics.tracked_locations.set(count as i64);
    }

    /// Encode every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        encoder
            .encode_to_string(&self.registry.gather())
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
    }

    /// Content type of [`Self::encode_text`] output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl CommandMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let commands_total = IntCounterVec::new(
            Opts::new("matchroom_commands_total", "Match commands processed"),
            &["command", "status"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let command_duration = Histogram::with_opts(
            HistogramOpts::new(
                "matchroom_command_duration_seconds",
                "Match command processing time",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        let parse_failures_total = IntCounter::new(
            "matchroom_parse_failures_total",
            "Match bodies that failed to decode",
        )?;
        registry.register(Box::new(parse_failures_total.clone()))?;

        let room_searches_total = IntCounterVec::new(
            Opts::new("matchroom_room_searches_total", "Best-room searches"),
            &["outcome"],
        )?;
        registry.register(Box::new(room_searches_total.clone()))?;

        Ok(Self {
            commands_total,
            command_duration,
            parse_failures_total,
            room_searches_total,
        })
    }
}

impl RoomMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rooms_created_total =
            IntCounter::new("matchroom_rooms_created_total", "Total rooms created")?;
        registry.register(Box::new(rooms_created_total.clone()))?;

        let active_rooms = IntGauge::new("matchroom_active_rooms", "Rooms currently registered")?;
        registry.register(Box::new(active_rooms.clone()))?;

        let members_in_rooms =
            IntGauge::new("matchroom_members_in_rooms", "Users currently in a room")?;
        registry.register(Box::new(members_in_rooms.clone()))?;

        let host_migrations = IntGauge::new(
            "matchroom_host_migrations",
            "Rooms whose control passed to another member since startup",
        )?;
        registry.register(Box::new(host_migrations.clone()))?;

        let tracked_locations = IntGauge::new(
            "matchroom_tracked_locations",
            "Users with a recorded location",
        )?;
        registry.register(Box::new(tracked_locations.clone()))?;

        Ok(Self {
            rooms_created_total,
            active_rooms,
            members_in_rooms,
            host_migrations,
            tracked_locations,
        })
    }
}
