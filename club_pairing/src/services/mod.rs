//! External collaborators consumed through narrow async interfaces.
//!
//! Each trait has a PostgreSQL implementation ([`postgres`]) and an
//! in-memory one ([`memory`]) for development mode and tests.

use async_trait::async_trait;
use std::sync::Arc;

use crate::tournament::models::{NewTournament, PlayerId, PlayerProfile, Tournament, TournamentId, UserId};

pub mod errors;
pub mod memory;
pub mod postgres;

pub use errors::{ServiceError, ServiceResult};

/// Read access to the club's player records
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Look up a player; `None` when no such player exists
    async fn find_player(&self, player_id: PlayerId) -> ServiceResult<Option<PlayerProfile>>;
}

/// Durable storage of tournament snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, tournament_id: TournamentId) -> ServiceResult<Option<Tournament>>;

    /// Overwrite the stored snapshot
    async fn save(&self, tournament: &Tournament) -> ServiceResult<()>;

    /// Store a new, not-yet-started tournament and assign its ID
    async fn create(&self, new: NewTournament) -> ServiceResult<Tournament>;
}

/// Decides who may run a tournament
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn is_organizer(&self, tournament_id: TournamentId, user_id: UserId) -> ServiceResult<bool>;
}

/// Bundle of collaborators handed to the room registry
#[derive(Clone)]
pub struct Services {
    pub players: Arc<dyn PlayerDirectory>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub authorizer: Arc<dyn Authorizer>,
}

impl Services {
    /// PostgreSQL-backed services sharing one pool
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            players: Arc::new(postgres::PgPlayerDirectory::new(pool.clone())),
            snapshots: Arc::new(postgres::PgSnapshotStore::new(pool.clone())),
            authorizer: Arc::new(postgres::PgAuthorizer::new(pool)),
        }
    }

    /// In-memory services. The returned handles let callers seed players
    /// and inspect stored snapshots.
    pub fn in_memory() -> (Self, Arc<memory::InMemoryPlayerDirectory>, Arc<memory::InMemorySnapshotStore>) {
        let players = Arc::new(memory::InMemoryPlayerDirectory::new());
        let snapshots = Arc::new(memory::InMemorySnapshotStore::new());
        let services = Self {
            players: players.clone(),
            snapshots: snapshots.clone(),
            authorizer: snapshots.clone(),
        };
        (services, players, snapshots)
    }
}
