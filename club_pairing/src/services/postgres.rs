//! PostgreSQL implementations of the collaborator traits.
//!
//! Snapshots are stored as JSON text in `tournament_snapshots`
//! (see [`crate::db::Database::ensure_schema`]). Player profiles are read
//! from the club's `players` table.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{Authorizer, PlayerDirectory, ServiceError, ServiceResult, SnapshotStore};
use crate::tournament::models::{NewTournament, PlayerId, PlayerProfile, Tournament, TournamentId, UserId};

pub struct PgPlayerDirectory {
    pool: PgPool,
}

impl PgPlayerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerDirectory for PgPlayerDirectory {
    async fn find_player(&self, player_id: PlayerId) -> ServiceResult<Option<PlayerProfile>> {
        let row = sqlx::query("SELECT id, nickname, rating FROM players WHERE id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| PlayerProfile {
            id: r.get("id"),
            nickname: r.get("nickname"),
            rating: u32::try_from(r.get::<i32, _>("rating")).unwrap_or(0),
        }))
    }
}

pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn load(&self, tournament_id: TournamentId) -> ServiceResult<Option<Tournament>> {
        let row = sqlx::query("SELECT snapshot FROM tournament_snapshots WHERE id = $1")
            .bind(tournament_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let snapshot: String = r.get("snapshot");
                Ok(Some(serde_json::from_str(&snapshot)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, tournament: &Tournament) -> ServiceResult<()> {
        let snapshot = serde_json::to_string(tournament)?;

        let result = sqlx::query(
            "UPDATE tournament_snapshots SET snapshot = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(tournament.id)
        .bind(snapshot)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::MissingSnapshot(tournament.id));
        }

        Ok(())
    }

    async fn create(&self, new: NewTournament) -> ServiceResult<Tournament> {
        new.validate().map_err(ServiceError::InvalidTournament)?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO tournament_snapshots (organizer_id, snapshot) VALUES ($1, '{}') RETURNING id",
        )
        .bind(new.organizer_id)
        .fetch_one(&mut *tx)
        .await?;

        let tournament = Tournament::from_new(row.get("id"), new);

        sqlx::query("UPDATE tournament_snapshots SET snapshot = $2 WHERE id = $1")
            .bind(tournament.id)
            .bind(serde_json::to_string(&tournament)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        log::info!(
            "Created {} tournament {} '{}'",
            tournament.format,
            tournament.id,
            tournament.name
        );

        Ok(tournament)
    }
}

/// Organizer is whoever created the tournament
pub struct PgAuthorizer {
    pool: PgPool,
}

impl PgAuthorizer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Authorizer for PgAuthorizer {
    async fn is_organizer(&self, tournament_id: TournamentId, user_id: UserId) -> ServiceResult<bool> {
        let organizer: Option<i64> =
            sqlx::query_scalar("SELECT organizer_id FROM tournament_snapshots WHERE id = $1")
                .bind(tournament_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(organizer == Some(user_id))
    }
}
