//! Room actor owning one tournament's authoritative state.

use super::{
    config::RoomConfig,
    errors::DispatchError,
    messages::{AuthContext, ConnectionId, Joined, Role, RoomInfo, RoomMessage},
};
use crate::{
    net::messages::{ClientCommand, ServerEvent},
    services::Services,
    tournament::models::{Tournament, TournamentId, UserId},
};
use chrono::Utc;
use std::collections::HashMap;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    time::{Instant, MissedTickBehavior, interval},
};

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    tournament_id: TournamentId,
}

impl RoomHandle {
    pub fn new(sender: mpsc::Sender<RoomMessage>, tournament_id: TournamentId) -> Self {
        Self {
            sender,
            tournament_id,
        }
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Room is closed".to_string())
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

struct Connection {
    user_id: Option<UserId>,
    role: Role,
    sender: mpsc::Sender<ServerEvent>,
    last_seen: Instant,
}

/// Actor serializing every command of one tournament.
///
/// Commands are applied to a clone of the snapshot, persisted, and only
/// then committed and broadcast, so connections see events in exactly the
/// order they were applied.
pub struct RoomActor {
    id: TournamentId,
    config: RoomConfig,
    tournament: Tournament,
    inbox: mpsc::Receiver<RoomMessage>,
    services: Services,
    connections: HashMap<ConnectionId, Connection>,
    /// First organizer connection
    primary: Option<ConnectionId>,
    /// Set while the room has no connections
    idle_since: Option<Instant>,
    is_closed: bool,
}

impl RoomActor {
    pub fn new(tournament: Tournament, config: RoomConfig, services: Services) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity);
        let id = tournament.id;

        let actor = Self {
            id,
            config,
            tournament,
            inbox,
            services,
            connections: HashMap::new(),
            primary: None,
            idle_since: Some(Instant::now()),
            is_closed: false,
        };

        (actor, RoomHandle::new(sender, id))
    }

    /// Run the room event loop until it is closed or evicted
    pub async fn run(mut self) {
        log::info!("Room {} '{}' opened", self.id, self.tournament.name);

        let mut sweep = interval(self.config.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => {
                        self.handle_message(message).await;
                        if self.is_closed {
                            break;
                        }
                    }
                    None => break,
                },

                _ = sweep.tick() => {
                    self.sweep();
                    if self.idle_expired() {
                        match self.services.snapshots.save(&self.tournament).await {
                            Ok(()) => {
                                log::info!("Room {} idle, evicting", self.id);
                                break;
                            }
                            Err(e) => {
                                log::warn!("Room {}: snapshot not saved, eviction postponed: {}", self.id, e);
                                self.idle_since = Some(Instant::now());
                            }
                        }
                    }
                }
            }
        }

        log::info!("Room {} '{}' closed", self.id, self.tournament.name);
    }

    async fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                connection_id,
                auth,
                role,
                sender,
                response,
            } => {
                let joined = self.handle_join(connection_id, auth, role, sender);
                let _ = response.send(joined);
            }

            RoomMessage::Leave { connection_id } => {
                self.remove_connection(connection_id, "left");
            }

            RoomMessage::Dispatch {
                connection_id,
                auth,
                command,
                response,
            } => {
                if let Some(id) = connection_id {
                    self.touch(id);
                }

                let result = self.handle_dispatch(connection_id, auth, command).await;
                if let (Err(error), Some(id)) = (&result, connection_id) {
                    self.send_to(id, error.to_event());
                }
                let _ = response.send(result);
            }

            RoomMessage::Heartbeat { connection_id } => {
                self.touch(connection_id);
                self.send_to(connection_id, ServerEvent::Pong);
            }

            RoomMessage::GetSnapshot { response } => {
                let _ = response.send(self.tournament.clone());
            }

            RoomMessage::GetInfo { response } => {
                let _ = response.send(self.info());
            }

            RoomMessage::Close { response } => {
                if let Err(e) = self.services.snapshots.save(&self.tournament).await {
                    log::warn!("Room {}: snapshot not saved on close: {}", self.id, e);
                }
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    fn handle_join(
        &mut self,
        connection_id: ConnectionId,
        auth: AuthContext,
        role: Role,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Option<Joined> {
        let snapshot = ServerEvent::FullStateSnapshot {
            tournament: self.tournament.clone(),
        };
        if sender.try_send(snapshot).is_err() {
            log::debug!("Room {}: connection {} gone before joining", self.id, connection_id);
            return None;
        }

        let primary = role == Role::Organizer && self.primary.is_none();
        if primary {
            self.primary = Some(connection_id);
        }

        self.connections.insert(
            connection_id,
            Connection {
                user_id: auth.user_id,
                role,
                sender,
                last_seen: Instant::now(),
            },
        );
        self.idle_since = None;

        log::info!(
            "Room {}: {} {} joined ({} connected)",
            self.id,
            role,
            connection_id,
            self.connections.len()
        );

        Some(Joined { primary })
    }

    async fn handle_dispatch(
        &mut self,
        connection_id: Option<ConnectionId>,
        auth: AuthContext,
        command: ClientCommand,
    ) -> Result<(), DispatchError> {
        command.validate().map_err(DispatchError::validation)?;

        match command {
            ClientCommand::Ping => {
                if let Some(id) = connection_id {
                    self.send_to(id, ServerEvent::Pong);
                }
                return Ok(());
            }
            ClientCommand::RequestSnapshot => {
                if let Some(id) = connection_id {
                    let snapshot = ServerEvent::FullStateSnapshot {
                        tournament: self.tournament.clone(),
                    };
                    self.send_to(id, snapshot);
                }
                return Ok(());
            }
            _ => {}
        }

        let user_id = self.authorize(auth, &command).await?;
        let command = self.resolve_player(command).await?;

        let mut next = self.tournament.clone();
        let events = next.apply(&command, Utc::now())?;
        if events.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.services.snapshots.save(&next).await {
            log::error!(
                "Room {}: '{}' not applied, snapshot save failed: {}",
                self.id,
                command.kind(),
                e
            );
            return Err(DispatchError::Persistence(e));
        }

        self.tournament = next;
        log::info!("Room {}: organizer {} {}", self.id, user_id, command);

        for event in &events {
            self.broadcast(event);
        }

        Ok(())
    }

    async fn authorize(&self, auth: AuthContext, command: &ClientCommand) -> Result<UserId, DispatchError> {
        let Some(user_id) = auth.user_id else {
            return Err(DispatchError::Authorization(command.kind().to_string()));
        };

        let allowed = self
            .services
            .authorizer
            .is_organizer(self.id, user_id)
            .await
            .map_err(DispatchError::Service)?;

        if !allowed {
            log::warn!(
                "Room {}: user {} sent {} without organizer rights",
                self.id,
                user_id,
                command.kind()
            );
            return Err(DispatchError::Authorization(command.kind().to_string()));
        }

        Ok(user_id)
    }

    /// Replace a client-supplied profile with the directory's record
    async fn resolve_player(&self, command: ClientCommand) -> Result<ClientCommand, DispatchError> {
        let ClientCommand::AddPlayer { player } = command else {
            return Ok(command);
        };

        match self
            .services
            .players
            .find_player(player.id)
            .await
            .map_err(DispatchError::Service)?
        {
            Some(profile) => Ok(ClientCommand::AddPlayer { player: profile }),
            None => Err(DispatchError::NotFound(format!("Player {}", player.id))),
        }
    }

    fn touch(&mut self, connection_id: ConnectionId) {
        if let Some(connection) = self.connections.get_mut(&connection_id) {
            connection.last_seen = Instant::now();
        }
    }

    /// Queue an event for one connection
    fn send_to(&mut self, connection_id: ConnectionId, event: ServerEvent) {
        let Some(connection) = self.connections.get(&connection_id) else {
            return;
        };

        match connection.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.remove_connection(connection_id, "queue full"),
            Err(TrySendError::Closed(_)) => self.remove_connection(connection_id, "closed"),
        }
    }

    /// Queue an event for every connection. Slow connections are dropped
    /// instead of blocking the room.
    fn broadcast(&mut self, event: &ServerEvent) {
        let mut dropped = Vec::new();

        for (id, connection) in &self.connections {
            match connection.sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => dropped.push((*id, "queue full")),
                Err(TrySendError::Closed(_)) => dropped.push((*id, "closed")),
            }
        }

        for (id, reason) in dropped {
            self.remove_connection(id, reason);
        }
    }

    fn remove_connection(&mut self, connection_id: ConnectionId, reason: &str) {
        let Some(connection) = self.connections.remove(&connection_id) else {
            return;
        };

        if reason == "queue full" {
            log::warn!(
                "Room {}: dropping {} {} (user {:?}), event queue full",
                self.id,
                connection.role,
                connection_id,
                connection.user_id
            );
        } else {
            log::info!(
                "Room {}: {} {} removed ({})",
                self.id,
                connection.role,
                connection_id,
                reason
            );
        }

        if self.primary == Some(connection_id) {
            self.primary = self
                .connections
                .iter()
                .find(|(_, c)| c.role == Role::Organizer)
                .map(|(id, _)| *id);
        }

        if self.connections.is_empty() {
            self.idle_since = Some(Instant::now());
        }
    }

    /// Drop connections that went silent or whose socket is gone
    fn sweep(&mut self) {
        let timeout = self.config.heartbeat_timeout();
        let now = Instant::now();

        let stale: Vec<(ConnectionId, &'static str)> = self
            .connections
            .iter()
            .filter_map(|(id, c)| {
                if c.sender.is_closed() {
                    Some((*id, "closed"))
                } else if now.duration_since(c.last_seen) > timeout {
                    Some((*id, "heartbeat timeout"))
                } else {
                    None
                }
            })
            .collect();

        for (id, reason) in stale {
            self.remove_connection(id, reason);
        }
    }

    fn idle_expired(&self) -> bool {
        self.connections.is_empty()
            && self
                .idle_since
                .is_some_and(|since| since.elapsed() >= self.config.idle_timeout())
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            tournament_id: self.id,
            status: self.tournament.status,
            connections: self.connections.len(),
            organizers: self
                .connections
                .values()
                .filter(|c| c.role == Role::Organizer)
                .count(),
        }
    }
}
