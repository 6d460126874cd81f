//! Tournament lifecycle: legal transitions and the events they produce.
//!
//! Every command is first checked against the unchanged snapshot and turned
//! into a list of [`ServerEvent`]s. Only then are the events folded into the
//! state with [`Tournament::apply_event`], which cannot fail. A rejected
//! command therefore never leaves a partial change behind, and clients replay
//! the very same events to stay in sync.

use super::{
    errors::{TournamentError, TournamentResult},
    models::{GameId, GameResult, Player, PlayerId, PlayerProfile, Tournament, TournamentFormat, TournamentStatus},
    pairing::{generate_round, round_robin},
};
use crate::net::messages::{ClientCommand, ServerEvent};
use chrono::{DateTime, Utc};

impl Tournament {
    /// Apply a client command at time `now`.
    ///
    /// Returns the events to broadcast. An empty list means the command was
    /// accepted but changed nothing (e.g. resubmitting the same result).
    ///
    /// # Errors
    ///
    /// Returns a [`TournamentError`] and leaves the tournament untouched when
    /// the command is illegal in the current state.
    pub fn apply(&mut self, command: &ClientCommand, now: DateTime<Utc>) -> TournamentResult<Vec<ServerEvent>> {
        let events = self.plan(command, now)?;
        for event in &events {
            self.apply_event(event);
        }
        Ok(events)
    }

    fn plan(&self, command: &ClientCommand, now: DateTime<Utc>) -> TournamentResult<Vec<ServerEvent>> {
        match command {
            ClientCommand::StartTournament => self.plan_start(now),
            ClientCommand::SubmitResult { game_id, result } => self.plan_submit_result(*game_id, *result),
            ClientCommand::AdvanceRound => self.plan_advance_round(now),
            ClientCommand::FinishTournament => self.plan_finish(now),
            ClientCommand::ResetTournament => Ok(vec![ServerEvent::TournamentReset]),
            ClientCommand::AddPlayer { player } => self.plan_add_player(player),
            ClientCommand::RemovePlayer { player_id } => self.plan_remove_player(*player_id),
            ClientCommand::Ping | ClientCommand::RequestSnapshot => Ok(Vec::new()),
        }
    }

    fn ensure_ongoing(&self) -> TournamentResult<()> {
        if self.status == TournamentStatus::Ongoing {
            Ok(())
        } else {
            Err(TournamentError::NotOngoing { status: self.status })
        }
    }

    fn plan_start(&self, now: DateTime<Utc>) -> TournamentResult<Vec<ServerEvent>> {
        if self.status != TournamentStatus::NotStarted {
            return Err(TournamentError::AlreadyStarted);
        }

        let active = self.active_players().count();
        if active < 2 {
            return Err(TournamentError::NotEnoughPlayers { active });
        }

        let games = generate_round(self, 1)?;

        Ok(vec![
            ServerEvent::TournamentStarted { started_at: now },
            ServerEvent::RoundGenerated {
                round_number: 1,
                games,
            },
        ])
    }

    fn plan_submit_result(&self, game_id: GameId, result: GameResult) -> TournamentResult<Vec<ServerEvent>> {
        self.ensure_ongoing()?;

        let game = self
            .game(game_id)
            .ok_or(TournamentError::GameNotFound(game_id))?;

        if game.is_bye() {
            return Err(TournamentError::ByeHasNoResult(game_id));
        }

        if game.result == result {
            return Ok(Vec::new());
        }

        Ok(vec![ServerEvent::ResultUpdated { game_id, result }])
    }

    fn plan_advance_round(&self, now: DateTime<Utc>) -> TournamentResult<Vec<ServerEvent>> {
        self.ensure_ongoing()?;

        let pending = self.pending_games(self.current_round);
        if pending > 0 {
            return Err(TournamentError::RoundIncomplete {
                round: self.current_round,
                pending,
            });
        }

        if self
            .total_rounds
            .is_some_and(|total| self.current_round >= total)
        {
            return Ok(vec![ServerEvent::TournamentFinished { finished_at: now }]);
        }

        let round_number = self.current_round + 1;
        let games = generate_round(self, round_number)?;

        Ok(vec![ServerEvent::RoundGenerated {
            round_number,
            games,
        }])
    }

    fn plan_finish(&self, now: DateTime<Utc>) -> TournamentResult<Vec<ServerEvent>> {
        self.ensure_ongoing()?;

        if self.completed_rounds() == 0 {
            return Err(TournamentError::NoCompletedRound);
        }

        Ok(vec![ServerEvent::TournamentFinished { finished_at: now }])
    }

    fn plan_add_player(&self, profile: &PlayerProfile) -> TournamentResult<Vec<ServerEvent>> {
        if self.player(profile.id).is_some() {
            return Err(TournamentError::PlayerAlreadyInTournament(profile.id));
        }

        match (self.status, self.format) {
            (TournamentStatus::Finished, _) => {
                return Err(TournamentError::NotOngoing { status: self.status });
            }
            (TournamentStatus::Ongoing, TournamentFormat::RoundRobin) => {
                return Err(super::errors::PairingError::RosterLocked.into());
            }
            _ => {}
        }

        Ok(vec![ServerEvent::PlayerAdded {
            player: Player::from_profile(profile.clone()),
        }])
    }

    fn plan_remove_player(&self, player_id: PlayerId) -> TournamentResult<Vec<ServerEvent>> {
        if !self
            .active_players()
            .any(|p| p.id == player_id)
        {
            return Err(TournamentError::PlayerNotFound(player_id));
        }

        match (self.status, self.format) {
            (TournamentStatus::Finished, _) => {
                return Err(TournamentError::NotOngoing { status: self.status });
            }
            (TournamentStatus::Ongoing, TournamentFormat::RoundRobin) => {
                return Err(super::errors::PairingError::RosterLocked.into());
            }
            _ => {}
        }

        Ok(vec![ServerEvent::PlayerRemoved { player_id }])
    }

    /// Fold a broadcast event into the state and recompute standings.
    ///
    /// Used by the room after a command is accepted and by client replicas.
    /// Events referring to unknown games or players are ignored.
    pub fn apply_event(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::TournamentStarted { started_at } => {
                self.status = TournamentStatus::Ongoing;
                self.started_at = Some(*started_at);
                self.finished_at = None;
                if self.format == TournamentFormat::RoundRobin {
                    self.total_rounds =
                        Some(round_robin::total_rounds(self.active_players().count()));
                }
            }

            ServerEvent::RoundGenerated {
                round_number,
                games,
            } => {
                if self.round_games(*round_number).next().is_none() {
                    self.games.extend(games.iter().cloned());
                }
                self.current_round = *round_number;
            }

            ServerEvent::ResultUpdated { game_id, result } => {
                if let Some(game) = self.games.iter_mut().find(|g| g.id == *game_id) {
                    game.result = *result;
                }
            }

            ServerEvent::TournamentFinished { finished_at } => {
                self.status = TournamentStatus::Finished;
                self.finished_at = Some(*finished_at);
            }

            ServerEvent::TournamentReset => {
                self.status = TournamentStatus::NotStarted;
                self.games.clear();
                self.current_round = 0;
                self.started_at = None;
                self.finished_at = None;
                if self.format == TournamentFormat::RoundRobin {
                    self.total_rounds = None;
                }
                for player in &mut self.players {
                    player.withdrawn = false;
                }
            }

            ServerEvent::PlayerAdded { player } => {
                if self.player(player.id).is_none() {
                    self.players.push(player.clone());
                }
            }

            ServerEvent::PlayerRemoved { player_id } => {
                if self.status == TournamentStatus::NotStarted {
                    self.players.retain(|p| p.id != *player_id);
                } else if let Some(player) = self.players.iter_mut().find(|p| p.id == *player_id) {
                    player.withdrawn = true;
                }
            }

            ServerEvent::FullStateSnapshot { tournament } => {
                *self = tournament.clone();
            }

            ServerEvent::Error { .. } | ServerEvent::Pong => {}
        }

        self.recompute_standings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::{errors::PairingError, models::NewTournament};

    fn profile(id: PlayerId) -> PlayerProfile {
        PlayerProfile {
            id,
            nickname: format!("player{id}"),
            rating: 2000 - id as u32 * 10,
        }
    }

    fn tournament(format: TournamentFormat, players: i64, total_rounds: Option<u32>) -> Tournament {
        Tournament::from_new(
            3,
            NewTournament {
                name: "Spring open".to_string(),
                organizer_id: 99,
                format,
                total_rounds,
                players: (1..=players).map(profile).collect(),
            },
        )
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn complete_current_round(t: &mut Tournament, result: GameResult) {
        let ids: Vec<GameId> = t
            .round_games(t.current_round)
            .filter(|g| !g.is_bye())
            .map(|g| g.id)
            .collect();
        for game_id in ids {
            t.apply(&ClientCommand::SubmitResult { game_id, result }, now())
                .unwrap();
        }
    }

    #[test]
    fn test_start_generates_first_round() {
        let mut t = tournament(TournamentFormat::RoundRobin, 4, None);
        let events = t.apply(&ClientCommand::StartTournament, now()).unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ServerEvent::TournamentStarted { .. }));
        assert!(matches!(
            events[1],
            ServerEvent::RoundGenerated { round_number: 1, .. }
        ));
        assert_eq!(t.status, TournamentStatus::Ongoing);
        assert_eq!(t.current_round, 1);
        assert_eq!(t.total_rounds, Some(3));
        assert_eq!(t.games.len(), 2);
        assert!(t.started_at.is_some());
    }

    #[test]
    fn test_start_needs_two_players() {
        let mut t = tournament(TournamentFormat::Swiss, 1, None);
        let err = t.apply(&ClientCommand::StartTournament, now()).unwrap_err();
        assert_eq!(err, TournamentError::NotEnoughPlayers { active: 1 });
        assert_eq!(t.status, TournamentStatus::NotStarted);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut t = tournament(TournamentFormat::Swiss, 4, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        let before = t.clone();

        let err = t.apply(&ClientCommand::StartTournament, now()).unwrap_err();
        assert_eq!(err.code(), "ALREADY_STARTED");
        assert_eq!(t, before);
    }

    #[test]
    fn test_submit_result_is_idempotent() {
        let mut t = tournament(TournamentFormat::RoundRobin, 4, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        let game_id = t.games[0].id;

        let submit = ClientCommand::SubmitResult {
            game_id,
            result: GameResult::Draw,
        };
        assert_eq!(t.apply(&submit, now()).unwrap().len(), 1);
        let after_first = t.clone();
        assert!(t.apply(&submit, now()).unwrap().is_empty());
        assert_eq!(t, after_first);
    }

    #[test]
    fn test_correction_overwrites_only_that_game() {
        let mut t = tournament(TournamentFormat::RoundRobin, 4, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        complete_current_round(&mut t, GameResult::WhiteWin);

        let corrected = t.games[0].id;
        t.apply(
            &ClientCommand::SubmitResult {
                game_id: corrected,
                result: GameResult::BlackWin,
            },
            now(),
        )
        .unwrap();

        assert_eq!(t.games[0].result, GameResult::BlackWin);
        assert_eq!(t.games[1].result, GameResult::WhiteWin);

        let white = t.player(t.games[0].white_player_id).unwrap();
        assert_eq!((white.wins, white.losses), (0, 1));
    }

    #[test]
    fn test_submit_unknown_game_and_bye() {
        let mut t = tournament(TournamentFormat::RoundRobin, 3, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();

        let err = t
            .apply(
                &ClientCommand::SubmitResult {
                    game_id: 77,
                    result: GameResult::Draw,
                },
                now(),
            )
            .unwrap_err();
        assert_eq!(err, TournamentError::GameNotFound(77));

        let bye = t.games.iter().find(|g| g.is_bye()).unwrap().id;
        let err = t
            .apply(
                &ClientCommand::SubmitResult {
                    game_id: bye,
                    result: GameResult::WhiteWin,
                },
                now(),
            )
            .unwrap_err();
        assert_eq!(err, TournamentError::ByeHasNoResult(bye));
    }

    #[test]
    fn test_submit_before_start() {
        let mut t = tournament(TournamentFormat::Swiss, 4, None);
        let err = t
            .apply(
                &ClientCommand::SubmitResult {
                    game_id: 1,
                    result: GameResult::Draw,
                },
                now(),
            )
            .unwrap_err();
        assert_eq!(err.code(), "TOURNAMENT_NOT_ONGOING");
    }

    #[test]
    fn test_advance_requires_complete_round() {
        let mut t = tournament(TournamentFormat::RoundRobin, 4, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();

        let err = t.apply(&ClientCommand::AdvanceRound, now()).unwrap_err();
        assert_eq!(err, TournamentError::RoundIncomplete { round: 1, pending: 2 });
        assert_eq!(t.current_round, 1);
    }

    #[test]
    fn test_round_robin_runs_to_completion() {
        let mut t = tournament(TournamentFormat::RoundRobin, 4, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();

        for round in 1..=3 {
            assert_eq!(t.current_round, round);
            complete_current_round(&mut t, GameResult::Draw);
            t.apply(&ClientCommand::AdvanceRound, now()).unwrap();
        }

        assert_eq!(t.status, TournamentStatus::Finished);
        assert!(t.finished_at.is_some());
        assert_eq!(t.games.len(), 6);
        assert!(t.players.iter().all(|p| p.draws == 3));

        let err = t
            .apply(
                &ClientCommand::SubmitResult {
                    game_id: 1,
                    result: GameResult::WhiteWin,
                },
                now(),
            )
            .unwrap_err();
        assert_eq!(err.code(), "TOURNAMENT_NOT_ONGOING");
    }

    #[test]
    fn test_swiss_with_configured_rounds_finishes_itself() {
        let mut t = tournament(TournamentFormat::Swiss, 6, Some(2));
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        complete_current_round(&mut t, GameResult::WhiteWin);
        t.apply(&ClientCommand::AdvanceRound, now()).unwrap();
        complete_current_round(&mut t, GameResult::BlackWin);

        let events = t.apply(&ClientCommand::AdvanceRound, now()).unwrap();
        assert!(matches!(events[0], ServerEvent::TournamentFinished { .. }));
        assert_eq!(t.status, TournamentStatus::Finished);
    }

    #[test]
    fn test_adaptive_swiss_keeps_pairing_until_finished() {
        let mut t = tournament(TournamentFormat::Swiss, 4, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        for _ in 0..4 {
            complete_current_round(&mut t, GameResult::WhiteWin);
            t.apply(&ClientCommand::AdvanceRound, now()).unwrap();
        }
        assert_eq!(t.current_round, 5);
        assert_eq!(t.status, TournamentStatus::Ongoing);

        t.apply(&ClientCommand::FinishTournament, now()).unwrap();
        assert_eq!(t.status, TournamentStatus::Finished);
    }

    #[test]
    fn test_finish_needs_completed_round() {
        let mut t = tournament(TournamentFormat::Swiss, 4, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        let err = t.apply(&ClientCommand::FinishTournament, now()).unwrap_err();
        assert_eq!(err, TournamentError::NoCompletedRound);
    }

    #[test]
    fn test_reset_keeps_roster() {
        let mut t = tournament(TournamentFormat::Swiss, 5, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        complete_current_round(&mut t, GameResult::WhiteWin);
        t.apply(&ClientCommand::RemovePlayer { player_id: 2 }, now())
            .unwrap();
        let roster: Vec<PlayerId> = t.players.iter().map(|p| p.id).collect();

        t.apply(&ClientCommand::ResetTournament, now()).unwrap();

        assert_eq!(t.status, TournamentStatus::NotStarted);
        assert!(t.games.is_empty());
        assert_eq!(t.current_round, 0);
        assert!(t.started_at.is_none());
        assert_eq!(t.players.iter().map(|p| p.id).collect::<Vec<_>>(), roster);
        assert!(t.players.iter().all(|p| !p.withdrawn && p.games_played() == 0));
    }

    #[test]
    fn test_roster_changes() {
        let mut t = tournament(TournamentFormat::RoundRobin, 4, None);
        t.apply(&ClientCommand::AddPlayer { player: profile(5) }, now())
            .unwrap();
        let err = t
            .apply(&ClientCommand::AddPlayer { player: profile(5) }, now())
            .unwrap_err();
        assert_eq!(err, TournamentError::PlayerAlreadyInTournament(5));

        t.apply(&ClientCommand::RemovePlayer { player_id: 5 }, now())
            .unwrap();
        assert!(t.player(5).is_none());

        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        let err = t
            .apply(&ClientCommand::AddPlayer { player: profile(6) }, now())
            .unwrap_err();
        assert_eq!(err, TournamentError::Pairing(PairingError::RosterLocked));
        let err = t
            .apply(&ClientCommand::RemovePlayer { player_id: 1 }, now())
            .unwrap_err();
        assert_eq!(err.code(), "ROSTER_LOCKED");

        let err = t
            .apply(&ClientCommand::RemovePlayer { player_id: 42 }, now())
            .unwrap_err();
        assert_eq!(err, TournamentError::PlayerNotFound(42));
    }

    #[test]
    fn test_swiss_withdrawal_keeps_history() {
        let mut t = tournament(TournamentFormat::Swiss, 4, None);
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        complete_current_round(&mut t, GameResult::WhiteWin);

        t.apply(&ClientCommand::RemovePlayer { player_id: 1 }, now())
            .unwrap();
        t.apply(&ClientCommand::AddPlayer { player: profile(9) }, now())
            .unwrap();

        let withdrawn = t.player(1).unwrap();
        assert!(withdrawn.withdrawn);
        assert_eq!(withdrawn.games_played(), 1);

        t.apply(&ClientCommand::AdvanceRound, now()).unwrap();
        assert!(t.round_games(2).all(|g| !g.involves(1)));
        assert!(t.round_games(2).any(|g| g.involves(9)));
    }

    #[test]
    fn test_finished_tournament_rejects_roster_changes() {
        let mut t = tournament(TournamentFormat::Swiss, 2, Some(1));
        t.apply(&ClientCommand::StartTournament, now()).unwrap();
        complete_current_round(&mut t, GameResult::Draw);
        t.apply(&ClientCommand::AdvanceRound, now()).unwrap();
        assert_eq!(t.status, TournamentStatus::Finished);

        let err = t
            .apply(&ClientCommand::AddPlayer { player: profile(3) }, now())
            .unwrap_err();
        assert_eq!(err.code(), "TOURNAMENT_NOT_ONGOING");
    }

    #[test]
    fn test_events_replay_to_same_state() {
        let mut server = tournament(TournamentFormat::Swiss, 5, None);
        let mut replica = server.clone();

        let mut log = server.apply(&ClientCommand::StartTournament, now()).unwrap();
        let ids: Vec<GameId> = server.games.iter().filter(|g| !g.is_bye()).map(|g| g.id).collect();
        for game_id in ids {
            log.extend(
                server
                    .apply(
                        &ClientCommand::SubmitResult {
                            game_id,
                            result: GameResult::Draw,
                        },
                        now(),
                    )
                    .unwrap(),
            );
        }
        log.extend(server.apply(&ClientCommand::AdvanceRound, now()).unwrap());

        for event in &log {
            replica.apply_event(event);
        }
        assert_eq!(replica, server);
    }
}
