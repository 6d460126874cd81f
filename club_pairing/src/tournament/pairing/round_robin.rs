//! Round-robin scheduling with the circle method.

use super::{Pairing, PairingHistory};
use crate::tournament::{
    errors::PairingError,
    models::{PlayerId, Tournament},
};
use std::collections::HashSet;

/// Number of rounds for a roster of `players`: `n - 1` when even, `n` when odd.
pub fn total_rounds(players: usize) -> u32 {
    match players {
        0 | 1 => 0,
        n if n % 2 == 0 => (n - 1) as u32,
        n => n as u32,
    }
}

/// Raw circle-method boards for one round.
///
/// `None` is the phantom slot of an odd roster; its opponent has the bye.
/// Slot 0 stays fixed, the others rotate right by `round_number - 1`.
pub fn schedule_round(roster: &[PlayerId], round_number: u32) -> Vec<(Option<PlayerId>, Option<PlayerId>)> {
    let mut slots: Vec<Option<PlayerId>> = roster.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }

    let n = slots.len();
    if n < 2 || round_number == 0 {
        return Vec::new();
    }

    let shift = (round_number as usize - 1) % (n - 1);
    slots[1..].rotate_right(shift);

    (0..n / 2).map(|i| (slots[i], slots[n - 1 - i])).collect()
}

pub(super) fn pair_round(tournament: &Tournament, round_number: u32) -> Result<Vec<Pairing>, PairingError> {
    let roster: Vec<PlayerId> = tournament.active_players().map(|p| p.id).collect();

    let total = total_rounds(roster.len());
    if round_number > total {
        return Err(PairingError::ScheduleExhausted { total });
    }

    if round_number > 1 {
        let scheduled: HashSet<PlayerId> = tournament
            .round_games(1)
            .flat_map(|g| std::iter::once(g.white_player_id).chain(g.black_player_id))
            .collect();
        let current: HashSet<PlayerId> = roster.iter().copied().collect();
        if scheduled != current {
            return Err(PairingError::RosterLocked);
        }
    }

    let history = PairingHistory::from_games(&tournament.games);
    let mut pairings = Vec::with_capacity(roster.len().div_ceil(2));
    let mut bye = None;

    for board in schedule_round(&roster, round_number) {
        match board {
            (Some(a), Some(b)) => pairings.push(history.orient(a, b)),
            (Some(p), None) | (None, Some(p)) => bye = Some(p),
            (None, None) => {}
        }
    }

    if let Some(player) = bye {
        pairings.push(Pairing::bye(player));
    }

    Ok(pairings)
}
