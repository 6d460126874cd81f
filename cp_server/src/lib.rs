//! Live tournament pairing server.
//!
//! Serves tournament rooms from [`club_pairing`] over WebSocket, plus a small
//! HTTP API for creating tournaments and fetching snapshots.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
