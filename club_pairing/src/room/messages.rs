//! Messages accepted by a room actor.

use super::errors::DispatchError;
use crate::net::messages::{ClientCommand, ServerEvent};
use crate::tournament::models::{Tournament, TournamentId, TournamentStatus, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Identifies one live connection inside a room
pub type ConnectionId = Uuid;

/// What a connection may do in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Organizer,
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Organizer => write!(f, "organizer"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// Identity behind a connection or request, as established by the transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthContext {
    /// `None` for anonymous viewers
    pub user_id: Option<UserId>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }
}

/// A registered connection, returned by [`super::RoomRegistry::join`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSession {
    pub tournament_id: TournamentId,
    pub connection_id: ConnectionId,
    pub role: Role,
    pub auth: AuthContext,
    /// First organizer connection of the room
    pub primary: bool,
}

/// Reply to a join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joined {
    pub primary: bool,
}

/// Live room statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub tournament_id: TournamentId,
    pub status: TournamentStatus,
    pub connections: usize,
    pub organizers: usize,
}

/// Messages sent to a room actor
#[derive(Debug)]
pub enum RoomMessage {
    /// Register a connection; its queue receives a snapshot first.
    /// Answered with `None` when the snapshot could not be queued.
    Join {
        connection_id: ConnectionId,
        auth: AuthContext,
        role: Role,
        sender: mpsc::Sender<ServerEvent>,
        response: oneshot::Sender<Option<Joined>>,
    },

    /// Unregister a connection
    Leave { connection_id: ConnectionId },

    /// Apply a command on behalf of a connection (or of a plain HTTP caller
    /// when `connection_id` is `None`)
    Dispatch {
        connection_id: Option<ConnectionId>,
        auth: AuthContext,
        command: ClientCommand,
        response: oneshot::Sender<Result<(), DispatchError>>,
    },

    /// Connection is alive; answered with a pong
    Heartbeat { connection_id: ConnectionId },

    /// Clone of the authoritative snapshot
    GetSnapshot {
        response: oneshot::Sender<Tournament>,
    },

    GetInfo { response: oneshot::Sender<RoomInfo> },

    /// Save and stop the room
    Close { response: oneshot::Sender<()> },
}
