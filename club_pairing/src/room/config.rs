//! Room tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Room configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Capacity of each room's command inbox
    pub inbox_capacity: usize,

    /// Capacity of each connection's outbound event queue. A connection
    /// whose queue is full when an event is broadcast gets dropped.
    pub connection_queue: usize,

    /// Seconds a room may sit without connections before it is evicted
    pub idle_timeout_secs: u64,

    /// Seconds of silence after which a connection is considered dead
    pub heartbeat_timeout_secs: u64,

    /// Seconds between liveness sweeps
    pub sweep_interval_secs: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 100,
            connection_queue: 64,
            idle_timeout_secs: 300,
            heartbeat_timeout_secs: 45,
            sweep_interval_secs: 5,
        }
    }
}

impl RoomConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.inbox_capacity == 0 {
            return Err("Room inbox capacity must be at least 1".to_string());
        }

        // Room must fit the initial snapshot plus at least one event
        if self.connection_queue < 2 {
            return Err("Connection queue must hold at least 2 events".to_string());
        }

        if self.sweep_interval_secs == 0 {
            return Err("Sweep interval must be at least 1 second".to_string());
        }

        if self.heartbeat_timeout_secs <= self.sweep_interval_secs {
            return Err(format!(
                "Heartbeat timeout ({}s) must exceed the sweep interval ({}s)",
                self.heartbeat_timeout_secs, self.sweep_interval_secs
            ));
        }

        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RoomConfig::default().validate().is_ok());
    }

    #[test]
    fn test_heartbeat_must_outlast_sweep() {
        let config = RoomConfig {
            heartbeat_timeout_secs: 5,
            sweep_interval_secs: 5,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_queue_must_hold_snapshot() {
        let config = RoomConfig {
            connection_queue: 1,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
