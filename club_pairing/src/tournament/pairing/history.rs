use super::Pairing;
use crate::tournament::models::{Game, GameResult, PlayerId};
use std::collections::{HashMap, HashSet};

/// Index over past games: who met whom, byes, color balance and scores.
///
/// Always rebuilt from the snapshot's games, never stored.
#[derive(Debug, Default, Clone)]
pub struct PairingHistory {
    played: HashSet<(PlayerId, PlayerId)>,
    byes: HashMap<PlayerId, u32>,
    colors: HashMap<PlayerId, i32>,
    scores: HashMap<PlayerId, u32>,
}

fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a < b { (a, b) } else { (b, a) }
}

impl PairingHistory {
    pub fn from_games(games: &[Game]) -> Self {
        let mut history = Self::default();

        for game in games {
            let white = game.white_player_id;
            let Some(black) = game.black_player_id else {
                *history.byes.entry(white).or_default() += 1;
                continue;
            };

            history.played.insert(key(white, black));
            *history.colors.entry(white).or_default() += 1;
            *history.colors.entry(black).or_default() -= 1;

            let (white_halves, black_halves) = match game.result {
                GameResult::Unset => (0, 0),
                GameResult::WhiteWin => (2, 0),
                GameResult::BlackWin => (0, 2),
                GameResult::Draw => (1, 1),
            };
            *history.scores.entry(white).or_default() += white_halves;
            *history.scores.entry(black).or_default() += black_halves;
        }

        history
    }

    /// Whether the two players already met (in either color)
    pub fn have_played(&self, a: PlayerId, b: PlayerId) -> bool {
        self.played.contains(&key(a, b))
    }

    pub fn bye_count(&self, player: PlayerId) -> u32 {
        self.byes.get(&player).copied().unwrap_or(0)
    }

    /// Games as white minus games as black
    pub fn color_balance(&self, player: PlayerId) -> i32 {
        self.colors.get(&player).copied().unwrap_or(0)
    }

    /// Score in half points
    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores.get(&player).copied().unwrap_or(0)
    }

    /// Give white to the player with the lower color balance, lower ID on a tie
    pub fn orient(&self, a: PlayerId, b: PlayerId) -> Pairing {
        let balance_a = self.color_balance(a);
        let balance_b = self.color_balance(b);

        if balance_a < balance_b || (balance_a == balance_b && a < b) {
            Pairing::new(a, b)
        } else {
            Pairing::new(b, a)
        }
    }
}
