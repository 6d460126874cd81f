//! Swiss pairing: score brackets, floaters and minimal rematches.
//!
//! Round 1 seeds by rating (top half against bottom half). Later rounds rank
//! players by score, rating and ID, pair each score bracket without rematches
//! where possible and float the leftovers down. A rematch is only accepted
//! when no rematch-free pairing of the remaining players exists; the search
//! then picks the pairing with the fewest rematches, trying opponents in rank
//! order so the closest score absorbs it.

use super::{Pairing, PairingHistory};
use crate::tournament::models::{PlayerId, Tournament};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::{cmp::Ordering, collections::HashMap};

/// Upper bound on search steps for one matching search, or for the whole
/// fewest-rematch search across all allowances
const SEARCH_STEPS: usize = 200_000;

#[derive(Debug, Clone, Copy)]
struct Ranked {
    id: PlayerId,
    score: u32,
    rating: u32,
}

fn rank_order(a: &Ranked, b: &Ranked) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(b.rating.cmp(&a.rating))
        .then(a.id.cmp(&b.id))
}

struct Budget {
    remaining: usize,
}

impl Budget {
    fn new(steps: usize) -> Self {
        Self { remaining: steps }
    }

    fn spend(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

pub(super) fn pair_round(tournament: &Tournament, round_number: u32) -> Vec<Pairing> {
    let history = PairingHistory::from_games(&tournament.games);
    if round_number == 1 {
        first_round(tournament)
    } else {
        later_round(tournament, &history)
    }
}

fn first_round(tournament: &Tournament) -> Vec<Pairing> {
    let mut seeds: Vec<(PlayerId, u32)> = tournament
        .active_players()
        .map(|p| (p.id, p.rating))
        .collect();

    if seeds.iter().all(|(_, rating)| *rating == 0) {
        seeds.sort_by_key(|(id, _)| *id);
        let mut rng = StdRng::seed_from_u64(tournament.id as u64);
        seeds.shuffle(&mut rng);
    } else {
        seeds.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    }

    let bye = if seeds.len() % 2 == 1 {
        seeds.pop().map(|(id, _)| id)
    } else {
        None
    };

    let half = seeds.len() / 2;
    let mut pairings: Vec<Pairing> = (0..half)
        .map(|board| {
            let top = seeds[board].0;
            let bottom = seeds[board + half].0;
            if board % 2 == 0 {
                Pairing::new(top, bottom)
            } else {
                Pairing::new(bottom, top)
            }
        })
        .collect();

    if let Some(player) = bye {
        pairings.push(Pairing::bye(player));
    }

    pairings
}

fn later_round(tournament: &Tournament, history: &PairingHistory) -> Vec<Pairing> {
    let mut ranked: Vec<Ranked> = tournament
        .active_players()
        .map(|p| Ranked {
            id: p.id,
            score: history.score(p.id),
            rating: p.rating,
        })
        .collect();
    ranked.sort_by(rank_order);

    let bye = if ranked.len() % 2 == 1 {
        select_bye(&ranked, history)
    } else {
        None
    };
    if let Some(bye) = bye {
        ranked.retain(|r| r.id != bye);
    }

    let order: Vec<PlayerId> = ranked.iter().map(|r| r.id).collect();
    let (mut pairs, forced) = pair_by_brackets(&ranked, history);

    if forced > 0 {
        match fewest_rematches(&order, history, &mut Budget::new(SEARCH_STEPS)) {
            Some((alternative, rematches)) if rematches < forced => {
                log::debug!(
                    "Tournament {}: bracket walk forced {} rematch(es), global search needs {}",
                    tournament.id,
                    forced,
                    rematches
                );
                pairs = alternative;
            }
            _ => {}
        }
    }

    let position: HashMap<PlayerId, usize> =
        order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let rank_of = |id: &PlayerId| position.get(id).copied().unwrap_or(usize::MAX);
    pairs.sort_by_key(|(a, b)| rank_of(a).min(rank_of(b)));

    let mut pairings: Vec<Pairing> = pairs
        .into_iter()
        .map(|(a, b)| history.orient(a, b))
        .collect();

    if let Some(player) = bye {
        pairings.push(Pairing::bye(player));
    }

    pairings
}

/// Fewest byes, then lowest score, then lowest ID
fn select_bye(ranked: &[Ranked], history: &PairingHistory) -> Option<PlayerId> {
    ranked
        .iter()
        .min_by(|a, b| {
            history
                .bye_count(a.id)
                .cmp(&history.bye_count(b.id))
                .then(a.score.cmp(&b.score))
                .then(a.id.cmp(&b.id))
        })
        .map(|r| r.id)
}

/// Walk score brackets top-down. Returns the pairs and the number of rematches forced.
fn pair_by_brackets(ranked: &[Ranked], history: &PairingHistory) -> (Vec<(PlayerId, PlayerId)>, usize) {
    let mut budget = Budget::new(SEARCH_STEPS);
    let mut pairs = Vec::with_capacity(ranked.len() / 2);
    let mut floaters: Vec<PlayerId> = Vec::new();

    for bracket in ranked.chunk_by(|a, b| a.score == b.score) {
        let mut group = std::mem::take(&mut floaters);
        group.extend(bracket.iter().map(|r| r.id));

        let (bracket_pairs, left) = pair_bracket(&group, history, &mut budget);
        pairs.extend(bracket_pairs);
        floaters = left;
    }

    if floaters.is_empty() {
        return (pairs, 0);
    }

    if let Some(rest) = perfect_matching(&floaters, history, 0, &mut budget) {
        pairs.extend(rest);
        return (pairs, 0);
    }

    let (rest, forced) = closest_score_pairing(&floaters, history);
    pairs.extend(rest);
    (pairs, forced)
}

/// Pair one bracket (floaters first). Returns the pairs and the players floating down.
fn pair_bracket(
    group: &[PlayerId],
    history: &PairingHistory,
    budget: &mut Budget,
) -> (Vec<(PlayerId, PlayerId)>, Vec<PlayerId>) {
    if group.len() < 2 {
        return (Vec::new(), group.to_vec());
    }

    if group.len() % 2 == 0 {
        if let Some(pairs) = perfect_matching(group, history, 0, budget) {
            return (pairs, Vec::new());
        }
    } else {
        // Float the lowest-ranked player that leaves a clean bracket
        for skip in (0..group.len()).rev() {
            let rest: Vec<PlayerId> = group
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, id)| *id)
                .collect();
            if let Some(pairs) = perfect_matching(&rest, history, 0, budget) {
                return (pairs, vec![group[skip]]);
            }
        }
    }

    greedy_pairing(group, history)
}

/// Each player takes the first opponent it has not met; the rest float.
fn greedy_pairing(group: &[PlayerId], history: &PairingHistory) -> (Vec<(PlayerId, PlayerId)>, Vec<PlayerId>) {
    let mut remaining = group.to_vec();
    let mut pairs = Vec::new();
    let mut leftovers = Vec::new();

    while !remaining.is_empty() {
        let player = remaining.remove(0);
        match remaining.iter().position(|&o| !history.have_played(player, o)) {
            Some(pos) => pairs.push((player, remaining.remove(pos))),
            None => leftovers.push(player),
        }
    }

    (pairs, leftovers)
}

/// Like [`greedy_pairing`], but the next-ranked player is taken when no fresh
/// opponent is left. Returns the pairs and the number of rematches.
fn closest_score_pairing(ids: &[PlayerId], history: &PairingHistory) -> (Vec<(PlayerId, PlayerId)>, usize) {
    let mut remaining = ids.to_vec();
    let mut pairs = Vec::new();
    let mut rematches = 0;

    while remaining.len() >= 2 {
        let player = remaining.remove(0);
        let pos = match remaining.iter().position(|&o| !history.have_played(player, o)) {
            Some(pos) => pos,
            None => {
                rematches += 1;
                0
            }
        };
        pairs.push((player, remaining.remove(pos)));
    }

    (pairs, rematches)
}

/// Search the full ranked list for a pairing with as few rematches as possible.
///
/// Every allowance draws from the same `budget`; `None` once it runs out.
fn fewest_rematches(
    order: &[PlayerId],
    history: &PairingHistory,
    budget: &mut Budget,
) -> Option<(Vec<(PlayerId, PlayerId)>, usize)> {
    for allowance in 0..=order.len() / 2 {
        if budget.remaining == 0 {
            return None;
        }
        if let Some(pairs) = perfect_matching(order, history, allowance, budget) {
            let rematches = pairs
                .iter()
                .filter(|(a, b)| history.have_played(*a, *b))
                .count();
            return Some((pairs, rematches));
        }
    }
    None
}

/// Depth-first perfect matching over `ids` in rank order, using at most
/// `allowance` rematches. `None` when none exists or the budget runs out.
fn perfect_matching(
    ids: &[PlayerId],
    history: &PairingHistory,
    allowance: usize,
    budget: &mut Budget,
) -> Option<Vec<(PlayerId, PlayerId)>> {
    if ids.len() % 2 == 1 {
        return None;
    }

    let mut used = vec![false; ids.len()];
    let mut out = Vec::with_capacity(ids.len() / 2);
    search(ids, &mut used, allowance, history, budget, &mut out).then_some(out)
}

fn search(
    ids: &[PlayerId],
    used: &mut [bool],
    allowance: usize,
    history: &PairingHistory,
    budget: &mut Budget,
    out: &mut Vec<(PlayerId, PlayerId)>,
) -> bool {
    let Some(first) = used.iter().position(|u| !u) else {
        return true;
    };
    if !budget.spend() {
        return false;
    }

    used[first] = true;
    for candidate in first + 1..ids.len() {
        if used[candidate] {
            continue;
        }

        let rematch = history.have_played(ids[first], ids[candidate]);
        if rematch && allowance == 0 {
            continue;
        }

        used[candidate] = true;
        out.push((ids[first], ids[candidate]));

        let left = if rematch { allowance - 1 } else { allowance };
        if search(ids, used, left, history, budget, out) {
            return true;
        }

        out.pop();
        used[candidate] = false;
    }
    used[first] = false;

    false
}
