//! # Club Pairing
//!
//! Tournament pairing and live synchronization for chess clubs.
//!
//! The crate computes round pairings for round-robin and Swiss tournaments,
//! keeps the authoritative state of every running tournament in a room
//! actor, and fans out each state change to all connected clients in the
//! order it was applied.
//!
//! ## Architecture
//!
//! - [`tournament`]: data model, pairing generator and the lifecycle state
//!   machine (`not_started → ongoing → finished`, plus reset)
//! - [`room`]: one actor per live tournament, plus the registry that spawns,
//!   routes to and evicts rooms
//! - [`net`]: tagged JSON commands and events, the frame codec and the
//!   client-side replica
//! - [`services`]: player directory, snapshot store and authorizer traits
//!   with PostgreSQL and in-memory implementations
//! - [`db`]: PostgreSQL connection pool
//!
//! ## Example
//!
//! ```
//! use club_pairing::tournament::{generate_round, NewTournament, PlayerProfile, Tournament, TournamentFormat};
//!
//! let tournament = Tournament::from_new(
//!     1,
//!     NewTournament {
//!         name: "Club championship".to_string(),
//!         organizer_id: 1,
//!         format: TournamentFormat::Swiss,
//!         total_rounds: Some(5),
//!         players: (1..=6)
//!             .map(|id| PlayerProfile { id, nickname: format!("p{id}"), rating: 1400 + id as u32 })
//!             .collect(),
//!     },
//! );
//!
//! let round_one = generate_round(&tournament, 1).unwrap();
//! assert_eq!(round_one.len(), 3);
//! ```

/// PostgreSQL connection pool.
pub mod db;

/// Sync protocol: commands, events, codec and replica.
pub mod net;
pub use net::{codec, messages};

/// Live tournament rooms.
pub mod room;

/// External collaborator interfaces.
pub mod services;

/// Tournament model, pairing and state machine.
pub mod tournament;
pub use tournament::{
    Game, GameResult, PairingError, Player, PlayerProfile, Tournament, TournamentError,
    TournamentFormat, TournamentStatus,
};
