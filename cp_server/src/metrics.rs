//! Prometheus metrics for the pairing server.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener
//! when `METRICS_BIND` is set. Without an installed exporter every call here
//! is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cp_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::command_processed("submit_result", "ok");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Record a WebSocket connection joining a room.
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// Record a WebSocket connection going away.
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

/// A room closed a connection's event queue (slow consumer or missed heartbeats).
pub fn connection_dropped() {
    metrics::counter!("room_connections_dropped_total").increment(1);
}

// ============================================================================
// Room Metrics
// ============================================================================

/// Record a processed command with its outcome (`ok` or an error code).
pub fn command_processed(kind: &str, outcome: &str) {
    metrics::counter!("room_commands_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record command dispatch duration in milliseconds.
pub fn command_duration_ms(kind: &str, duration_ms: f64) {
    metrics::histogram!("room_command_duration_ms",
        "kind" => kind.to_string()
    )
    .record(duration_ms);
}

/// Set current running rooms count.
pub fn active_rooms(count: usize) {
    metrics::gauge!("active_rooms").set(count as f64);
}

// ============================================================================
// Throttling Metrics
// ============================================================================

/// Increment throttle hits counter.
pub fn throttle_hits_total(window: &str) {
    metrics::counter!("throttle_hits_total",
        "window" => window.to_string()
    )
    .increment(1);
}
