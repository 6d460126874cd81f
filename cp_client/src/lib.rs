//! Internal modules for the tournament client.
//!
//! This library provides command parsing, the HTTP client, state rendering
//! and the WebSocket session used by the cp_client binary.

pub mod api_client;
pub mod commands;
pub mod display;
pub mod websocket_client;
