//! Sync protocol: typed messages, the JSON frame codec and the client replica.

/// JSON text-frame encoding with size limits.
pub mod codec;

/// Codec error types.
pub mod errors;

/// Commands (client to room) and events (room to clients).
pub mod messages;

/// Client-side tournament mirror driven by events.
pub mod replica;
