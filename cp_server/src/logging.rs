//! Structured logging configuration.
//!
//! The library logs through the `log` facade; the subscriber installed here
//! picks those records up alongside the server's own `tracing` events.

use club_pairing::tournament::{TournamentId, UserId};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Dispatches slower than this are logged as warnings
const SLOW_OPERATION_MS: u64 = 250;

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var.
///
/// # Example
///
/// ```no_run
/// use cp_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn,tower_http=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `user_id` - Optional user ID
/// * `tournament_id` - Tournament the event concerns, if any
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use cp_server::logging::log_security_event;
///
/// log_security_event(
///     "unauthorized_command",
///     Some(123),
///     Some(7),
///     "Viewer tried to start the tournament"
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<UserId>,
    tournament_id: Option<TournamentId>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        tournament_id = tournament_id,
        "SECURITY: {}",
        message
    );
}

/// Log performance metric
///
/// # Arguments
///
/// * `operation` - Operation name
/// * `duration_ms` - Duration in milliseconds
/// * `metadata` - Additional metadata
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > SLOW_OPERATION_MS {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}
