//! Tournament data models: players, games, rounds and the tournament snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Tournament ID type
pub type TournamentId = i64;

/// Player ID type (assigned by the external player service)
pub type PlayerId = i64;

/// Game ID type (unique within a tournament)
pub type GameId = i64;

/// User ID type (assigned by the external account service)
pub type UserId = i64;

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Roster is being assembled
    NotStarted,
    /// Rounds are being played
    Ongoing,
    /// Event is over, games are locked
    Finished,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentStatus::NotStarted => write!(f, "not_started"),
            TournamentStatus::Ongoing => write!(f, "ongoing"),
            TournamentStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Pairing format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Everyone plays everyone once
    RoundRobin,
    /// Score-bracket pairing, adaptive per round
    Swiss,
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentFormat::RoundRobin => write!(f, "round_robin"),
            TournamentFormat::Swiss => write!(f, "swiss"),
        }
    }
}

/// Outcome of a single game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    #[default]
    Unset,
    WhiteWin,
    BlackWin,
    Draw,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            GameResult::Unset => "unset",
            GameResult::WhiteWin => "1-0",
            GameResult::BlackWin => "0-1",
            GameResult::Draw => "½-½",
        };
        write!(f, "{repr}")
    }
}

/// Player profile as served by the player directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub nickname: String,
    pub rating: u32,
}

/// A player's snapshot inside a tournament.
///
/// Standings fields are derived from game results by
/// [`Tournament::recompute_standings`] and never set by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub rating: u32,
    /// +1 for every game played as white, -1 for every game as black
    pub color_index: i32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    /// Withdrawn Swiss players keep their history but are no longer paired
    #[serde(default)]
    pub withdrawn: bool,
}

impl Player {
    /// Copy a directory profile into a fresh tournament player
    pub fn from_profile(profile: PlayerProfile) -> Self {
        Self {
            id: profile.id,
            nickname: profile.nickname,
            rating: profile.rating,
            color_index: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            withdrawn: false,
        }
    }

    /// Score in half points (win = 2, draw = 1)
    pub fn score_halves(&self) -> u32 {
        self.wins * 2 + self.draws
    }

    /// Score in points (win = 1, draw = 0.5)
    pub fn score(&self) -> f64 {
        f64::from(self.score_halves()) / 2.0
    }

    /// Number of decided games
    pub fn games_played(&self) -> u32 {
        self.wins + self.draws + self.losses
    }
}

/// A single game (or bye) of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    /// Round number (1-indexed)
    pub round_number: u32,
    pub white_player_id: PlayerId,
    /// `None` marks a bye for the white player
    pub black_player_id: Option<PlayerId>,
    pub result: GameResult,
}

impl Game {
    /// Whether this entry is a bye
    pub fn is_bye(&self) -> bool {
        self.black_player_id.is_none()
    }

    /// Byes count as resolved, real games once a result is set
    pub fn is_resolved(&self) -> bool {
        self.is_bye() || self.result != GameResult::Unset
    }

    /// Whether the player takes part in this game
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.white_player_id == player_id || self.black_player_id == Some(player_id)
    }

    /// The other player of this game, if any
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if self.white_player_id == player_id {
            self.black_player_id
        } else if self.black_player_id == Some(player_id) {
            Some(self.white_player_id)
        } else {
            None
        }
    }
}

/// Request to create a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTournament {
    pub name: String,
    pub organizer_id: UserId,
    pub format: TournamentFormat,
    /// Swiss only: fixed number of rounds, `None` for an open-ended event
    pub total_rounds: Option<u32>,
    /// Initial roster in seeding order
    pub players: Vec<PlayerProfile>,
}

impl NewTournament {
    /// Validate the request
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Tournament name must not be empty".to_string());
        }

        match (self.format, self.total_rounds) {
            (TournamentFormat::RoundRobin, Some(_)) => {
                return Err("Round-robin round count is derived from the roster".to_string());
            }
            (TournamentFormat::Swiss, Some(0)) => {
                return Err("Swiss round count must be at least 1".to_string());
            }
            _ => {}
        }

        let mut ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.players.len() {
            return Err("Roster contains the same player twice".to_string());
        }

        Ok(())
    }
}

/// Complete authoritative state of one tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub organizer_id: UserId,
    pub status: TournamentStatus,
    pub format: TournamentFormat,
    /// Round-robin: fixed at start. Swiss: configured value or `None` (adaptive)
    pub total_rounds: Option<u32>,
    /// 0 until the tournament starts
    pub current_round: u32,
    /// Roster in seeding order
    pub players: Vec<Player>,
    pub games: Vec<Game>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Build a not-yet-started tournament from a creation request
    pub fn from_new(id: TournamentId, new: NewTournament) -> Self {
        Self {
            id,
            name: new.name,
            organizer_id: new.organizer_id,
            status: TournamentStatus::NotStarted,
            format: new.format,
            total_rounds: match new.format {
                TournamentFormat::RoundRobin => None,
                TournamentFormat::Swiss => new.total_rounds,
            },
            current_round: 0,
            players: new.players.into_iter().map(Player::from_profile).collect(),
            games: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Look up a player by ID
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Players that are still paired (not withdrawn), in roster order
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.withdrawn)
    }

    /// Look up a game by ID
    pub fn game(&self, game_id: GameId) -> Option<&Game> {
        self.games.iter().find(|g| g.id == game_id)
    }

    /// Games of one round in board order
    pub fn round_games(&self, round_number: u32) -> impl Iterator<Item = &Game> {
        self.games
            .iter()
            .filter(move |g| g.round_number == round_number)
    }

    /// Games grouped by round number
    pub fn rounds(&self) -> BTreeMap<u32, Vec<&Game>> {
        let mut rounds: BTreeMap<u32, Vec<&Game>> = BTreeMap::new();
        for game in &self.games {
            rounds.entry(game.round_number).or_default().push(game);
        }
        rounds
    }

    /// Highest round number that has games, 0 if none
    pub fn latest_round(&self) -> u32 {
        self.games.iter().map(|g| g.round_number).max().unwrap_or(0)
    }

    /// Whether every game of the round has a result (byes count as resolved)
    pub fn is_round_complete(&self, round_number: u32) -> bool {
        let mut games = self.round_games(round_number).peekable();
        games.peek().is_some() && games.all(Game::is_resolved)
    }

    /// Number of unresolved games in a round
    pub fn pending_games(&self, round_number: u32) -> usize {
        self.round_games(round_number)
            .filter(|g| !g.is_resolved())
            .count()
    }

    /// Number of rounds whose games are all resolved
    pub fn completed_rounds(&self) -> u32 {
        (1..=self.latest_round())
            .filter(|round| self.is_round_complete(*round))
            .count() as u32
    }

    /// Next free game ID
    pub fn next_game_id(&self) -> GameId {
        self.games.iter().map(|g| g.id).max().unwrap_or(0) + 1
    }

    /// Players ordered by score, then rating, then ID
    pub fn standings(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| {
            b.score_halves()
                .cmp(&a.score_halves())
                .then(b.rating.cmp(&a.rating))
                .then(a.id.cmp(&b.id))
        });
        ranked
    }

    /// Rebuild wins/draws/losses and color balance from the games
    pub fn recompute_standings(&mut self) {
        for player in &mut self.players {
            player.color_index = 0;
            player.wins = 0;
            player.draws = 0;
            player.losses = 0;
        }

        for game in &self.games {
            let Some(black_id) = game.black_player_id else {
                continue;
            };
            let white_id = game.white_player_id;

            let (white_delta, black_delta) = match game.result {
                GameResult::Unset => (None, None),
                GameResult::WhiteWin => (Some(Outcome::Win), Some(Outcome::Loss)),
                GameResult::BlackWin => (Some(Outcome::Loss), Some(Outcome::Win)),
                GameResult::Draw => (Some(Outcome::Draw), Some(Outcome::Draw)),
            };

            for player in &mut self.players {
                if player.id == white_id {
                    player.color_index += 1;
                    tally(player, white_delta);
                } else if player.id == black_id {
                    player.color_index -= 1;
                    tally(player, black_delta);
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Win,
    Draw,
    Loss,
}

fn tally(player: &mut Player, outcome: Option<Outcome>) {
    match outcome {
        Some(Outcome::Win) => player.wins += 1,
        Some(Outcome::Draw) => player.draws += 1,
        Some(Outcome::Loss) => player.losses += 1,
        None => {}
    }
}
