//! In-memory collaborators for development mode and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::{Authorizer, PlayerDirectory, ServiceError, ServiceResult, SnapshotStore};
use crate::tournament::models::{NewTournament, PlayerId, PlayerProfile, Tournament, TournamentId, UserId};

#[derive(Default)]
pub struct InMemoryPlayerDirectory {
    players: RwLock<HashMap<PlayerId, PlayerProfile>>,
}

impl InMemoryPlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a player record
    pub async fn insert(&self, profile: PlayerProfile) {
        self.players.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryPlayerDirectory {
    async fn find_player(&self, player_id: PlayerId) -> ServiceResult<Option<PlayerProfile>> {
        Ok(self.players.read().await.get(&player_id).cloned())
    }
}

/// Snapshot store that also answers organizer checks from the stored
/// snapshots.
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<TournamentId, Tournament>>,
    next_id: AtomicI64,
    writable: AtomicBool,
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            writable: AtomicBool::new(true),
        }
    }
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) write access. While read-only,
    /// `save` and `create` fail with [`ServiceError::Unavailable`].
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }

    /// Number of stored snapshots
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }

    fn check_writable(&self) -> ServiceResult<()> {
        if self.writable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ServiceError::Unavailable("snapshot store is read-only".to_string()))
        }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self, tournament_id: TournamentId) -> ServiceResult<Option<Tournament>> {
        Ok(self.snapshots.read().await.get(&tournament_id).cloned())
    }

    async fn save(&self, tournament: &Tournament) -> ServiceResult<()> {
        self.check_writable()?;
        let mut snapshots = self.snapshots.write().await;
        match snapshots.get_mut(&tournament.id) {
            Some(stored) => {
                *stored = tournament.clone();
                Ok(())
            }
            None => Err(ServiceError::MissingSnapshot(tournament.id)),
        }
    }

    async fn create(&self, new: NewTournament) -> ServiceResult<Tournament> {
        self.check_writable()?;
        new.validate().map_err(ServiceError::InvalidTournament)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let tournament = Tournament::from_new(id, new);
        self.snapshots
            .write()
            .await
            .insert(id, tournament.clone());

        Ok(tournament)
    }
}

#[async_trait]
impl Authorizer for InMemorySnapshotStore {
    async fn is_organizer(&self, tournament_id: TournamentId, user_id: UserId) -> ServiceResult<bool> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(&tournament_id)
            .is_some_and(|t| t.organizer_id == user_id))
    }
}
