//! Registry mapping tournaments to their live room actors.

use super::{
    actor::{RoomActor, RoomHandle},
    config::RoomConfig,
    errors::{DispatchError, RegistryError},
    messages::{AuthContext, RoomInfo, RoomMessage, RoomSession, Role},
};
use crate::{
    net::messages::{ClientCommand, ServerEvent},
    services::Services,
    tournament::models::{NewTournament, PlayerId, Tournament, TournamentFormat, TournamentId, UserId},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc, oneshot};
use uuid::Uuid;

/// Creation request as sent by an organizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournament {
    pub name: String,
    pub format: TournamentFormat,
    #[serde(default)]
    pub total_rounds: Option<u32>,
    /// Initial roster, resolved through the player directory
    #[serde(default)]
    pub player_ids: Vec<PlayerId>,
}

/// Spawns rooms on demand and routes requests to them.
///
/// Rooms evict themselves once idle; the next request for the tournament
/// respawns the room from the snapshot store.
#[derive(Clone)]
pub struct RoomRegistry {
    config: RoomConfig,
    services: Services,
    rooms: Arc<RwLock<HashMap<TournamentId, RoomHandle>>>,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig, services: Services) -> Self {
        Self {
            config,
            services,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    async fn existing_room(&self, tournament_id: TournamentId) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms
            .get(&tournament_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Live room for the tournament, spawning it from the store if needed
    async fn live_room(&self, tournament_id: TournamentId) -> Result<RoomHandle, RegistryError> {
        if let Some(handle) = self.existing_room(tournament_id).await {
            return Ok(handle);
        }

        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(&tournament_id)
            && !handle.is_closed()
        {
            return Ok(handle.clone());
        }

        let tournament = self
            .services
            .snapshots
            .load(tournament_id)
            .await?
            .ok_or(RegistryError::TournamentNotFound(tournament_id))?;

        let (actor, handle) = RoomActor::new(tournament, self.config.clone(), self.services.clone());
        tokio::spawn(actor.run());
        rooms.insert(tournament_id, handle.clone());

        Ok(handle)
    }

    /// Send a request and wait for the reply. A room that stopped between
    /// lookup and delivery never processed the message, so it is respawned
    /// and the request retried once.
    async fn request<T>(
        &self,
        tournament_id: TournamentId,
        make: impl Fn(oneshot::Sender<T>) -> RoomMessage,
    ) -> Result<T, RegistryError> {
        for _ in 0..2 {
            let handle = self.live_room(tournament_id).await?;
            let (response, reply) = oneshot::channel();
            if handle.send(make(response)).await.is_err() {
                continue;
            }
            if let Ok(value) = reply.await {
                return Ok(value);
            }
        }

        Err(RegistryError::RoomClosed(tournament_id))
    }

    /// Register a connection. The receiver's first event is the full snapshot.
    pub async fn join(
        &self,
        tournament_id: TournamentId,
        auth: AuthContext,
    ) -> Result<(RoomSession, mpsc::Receiver<ServerEvent>), RegistryError> {
        // Unknown tournaments fail here, before the authorizer is asked
        self.live_room(tournament_id).await?;

        let is_organizer = match auth.user_id {
            Some(user_id) => {
                self.services
                    .authorizer
                    .is_organizer(tournament_id, user_id)
                    .await?
            }
            None => false,
        };
        let role = if is_organizer {
            Role::Organizer
        } else {
            Role::Viewer
        };

        let connection_id = Uuid::new_v4();
        let (sender, events) = mpsc::channel(self.config.connection_queue);

        let joined = self
            .request(tournament_id, |response| RoomMessage::Join {
                connection_id,
                auth,
                role,
                sender: sender.clone(),
                response,
            })
            .await?
            .ok_or(RegistryError::RoomClosed(tournament_id))?;

        Ok((
            RoomSession {
                tournament_id,
                connection_id,
                role,
                auth,
                primary: joined.primary,
            },
            events,
        ))
    }

    /// Apply a command on behalf of a connection
    pub async fn dispatch(&self, session: &RoomSession, command: ClientCommand) -> Result<(), DispatchError> {
        self.dispatch_as(
            session.tournament_id,
            Some(session.connection_id),
            session.auth,
            command,
        )
        .await
    }

    /// Apply a command for a caller that may not hold a connection
    pub async fn dispatch_as(
        &self,
        tournament_id: TournamentId,
        connection_id: Option<Uuid>,
        auth: AuthContext,
        command: ClientCommand,
    ) -> Result<(), DispatchError> {
        self.request(tournament_id, |response| RoomMessage::Dispatch {
            connection_id,
            auth,
            command: command.clone(),
            response,
        })
        .await?
    }

    /// Unregister a connection. No event is broadcast.
    pub async fn leave(&self, session: &RoomSession) {
        if let Some(handle) = self.existing_room(session.tournament_id).await {
            let _ = handle
                .send(RoomMessage::Leave {
                    connection_id: session.connection_id,
                })
                .await;
        }
    }

    /// Refresh a connection's liveness; the room answers with a pong
    pub async fn heartbeat(&self, session: &RoomSession) -> Result<(), RegistryError> {
        let handle = self
            .existing_room(session.tournament_id)
            .await
            .ok_or(RegistryError::RoomClosed(session.tournament_id))?;

        handle
            .send(RoomMessage::Heartbeat {
                connection_id: session.connection_id,
            })
            .await
            .map_err(|_| RegistryError::RoomClosed(session.tournament_id))
    }

    /// Clone of the authoritative snapshot
    pub async fn snapshot(&self, tournament_id: TournamentId) -> Result<Tournament, RegistryError> {
        self.request(tournament_id, |response| RoomMessage::GetSnapshot { response })
            .await
    }

    /// Statistics of a live room; `None` if the room is not running
    pub async fn room_info(&self, tournament_id: TournamentId) -> Option<RoomInfo> {
        let handle = self.existing_room(tournament_id).await?;
        let (response, reply) = oneshot::channel();
        handle.send(RoomMessage::GetInfo { response }).await.ok()?;
        reply.await.ok()
    }

    /// Create a tournament owned by `organizer_id`
    pub async fn create_tournament(
        &self,
        organizer_id: UserId,
        request: CreateTournament,
    ) -> Result<Tournament, RegistryError> {
        let mut players = Vec::with_capacity(request.player_ids.len());
        for player_id in &request.player_ids {
            let profile = self
                .services
                .players
                .find_player(*player_id)
                .await?
                .ok_or(RegistryError::PlayerNotFound(*player_id))?;
            players.push(profile);
        }

        let tournament = self
            .services
            .snapshots
            .create(NewTournament {
                name: request.name,
                organizer_id,
                format: request.format,
                total_rounds: request.total_rounds,
                players,
            })
            .await?;

        log::info!(
            "User {} created {} tournament {} '{}'",
            organizer_id,
            tournament.format,
            tournament.id,
            tournament.name
        );

        Ok(tournament)
    }

    /// Number of running rooms. Handles of stopped rooms are pruned.
    pub async fn active_rooms(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, handle| !handle.is_closed());
        rooms.len()
    }

    /// Save and stop every room
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();

        for handle in handles {
            let (response, reply) = oneshot::channel();
            if handle.send(RoomMessage::Close { response }).await.is_ok() {
                let _ = reply.await;
            }
        }

        log::info!("All tournament rooms closed");
    }
}
