//! Live tournament rooms built on the actor model.
//!
//! Each tournament with live connections runs one [`RoomActor`] in its own
//! Tokio task. The actor owns the snapshot and serializes every command
//! through its inbox; connections receive events through bounded queues.
//! [`RoomRegistry`] spawns rooms on demand and routes requests to them.
//!
//! ## Example
//!
//! ```no_run
//! use club_pairing::room::{AuthContext, RoomConfig, RoomRegistry};
//! use club_pairing::services::Services;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let (services, _players, _snapshots) = Services::in_memory();
//! let registry = RoomRegistry::new(RoomConfig::default(), services);
//!
//! let (session, mut events) = registry.join(1, AuthContext::anonymous()).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{event}");
//! }
//! registry.leave(&session).await;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;

pub use actor::{RoomActor, RoomHandle};
pub use config::RoomConfig;
pub use errors::{DispatchError, RegistryError};
pub use manager::{CreateTournament, RoomRegistry};
pub use messages::{AuthContext, ConnectionId, Role, RoomInfo, RoomMessage, RoomSession};
