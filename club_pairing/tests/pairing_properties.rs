/// Property-based tests for the pairing generator using proptest
///
/// These tests check the scheduling guarantees of both formats across
/// random roster sizes, ratings and results.
use club_pairing::tournament::{
    Game, GameResult, NewTournament, PlayerProfile, Tournament, TournamentFormat, generate_round,
    models::PlayerId, pairing::PairingHistory,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a < b { (a, b) } else { (b, a) }
}

fn tournament(format: TournamentFormat, ratings: &[u32]) -> Tournament {
    Tournament::from_new(
        11,
        NewTournament {
            name: "Property".to_string(),
            organizer_id: 1,
            format,
            total_rounds: None,
            players: ratings
                .iter()
                .enumerate()
                .map(|(i, rating)| PlayerProfile {
                    id: i as PlayerId + 1,
                    nickname: format!("p{}", i + 1),
                    rating: *rating,
                })
                .collect(),
        },
    )
}

fn result_from(seed: u8) -> GameResult {
    match seed % 3 {
        0 => GameResult::WhiteWin,
        1 => GameResult::BlackWin,
        _ => GameResult::Draw,
    }
}

/// Pair and play the next round, returning its games
fn play_round(t: &mut Tournament, results: &[u8]) -> Vec<Game> {
    let round = t.latest_round() + 1;
    let mut games = generate_round(t, round).unwrap();
    for (i, game) in games.iter_mut().enumerate().filter(|(_, g)| !g.is_bye()) {
        game.result = result_from(results.get(i).copied().unwrap_or(2));
    }
    t.games.extend(games.clone());
    t.current_round = round;
    t.recompute_standings();
    games
}

fn players_of(games: &[Game]) -> Vec<PlayerId> {
    let mut players: Vec<PlayerId> = games
        .iter()
        .flat_map(|g| std::iter::once(g.white_player_id).chain(g.black_player_id))
        .collect();
    players.sort_unstable();
    players
}

/// Fewest rematches any perfect matching of `ids` needs (brute force)
fn min_rematches(ids: &[PlayerId], played: &HashSet<(PlayerId, PlayerId)>) -> usize {
    let Some((&first, rest)) = ids.split_first() else {
        return 0;
    };
    rest.iter()
        .enumerate()
        .map(|(i, &other)| {
            let remaining: Vec<PlayerId> = rest
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, id)| *id)
                .collect();
            usize::from(played.contains(&key(first, other))) + min_rematches(&remaining, played)
        })
        .min()
        .unwrap_or(usize::MAX)
}

proptest! {
    #[test]
    fn test_round_robin_even_roster_meets_everyone_once(n in (1usize..=6).prop_map(|k| k * 2)) {
        let mut t = tournament(TournamentFormat::RoundRobin, &vec![1500; n]);
        let mut pairs = HashSet::new();

        for _ in 0..n - 1 {
            let games = play_round(&mut t, &[]);
            prop_assert_eq!(players_of(&games), (1..=n as PlayerId).collect::<Vec<_>>());
            for game in &games {
                let black = game.black_player_id.expect("even roster has no byes");
                prop_assert!(pairs.insert(key(game.white_player_id, black)));
            }
        }

        prop_assert_eq!(pairs.len(), n * (n - 1) / 2);
        prop_assert!(generate_round(&t, n as u32).is_err());
    }

    #[test]
    fn test_round_robin_odd_roster_gives_each_player_one_bye(n in (1usize..=5).prop_map(|k| k * 2 + 1)) {
        let mut t = tournament(TournamentFormat::RoundRobin, &vec![0; n]);
        let mut byes: HashMap<PlayerId, usize> = HashMap::new();
        let mut pairs = HashSet::new();

        for _ in 0..n {
            let games = play_round(&mut t, &[]);
            let round_byes: Vec<&Game> = games.iter().filter(|g| g.is_bye()).collect();
            prop_assert_eq!(round_byes.len(), 1);

            let bye = round_byes[0].white_player_id;
            prop_assert!(!byes.contains_key(&bye), "player {} got a second bye", bye);
            *byes.entry(bye).or_default() += 1;

            for game in games.iter().filter(|g| !g.is_bye()) {
                prop_assert!(pairs.insert(key(game.white_player_id, game.black_player_id.unwrap())));
            }
        }

        prop_assert_eq!(byes.len(), n);
        prop_assert_eq!(pairs.len(), n * (n - 1) / 2);
    }

    #[test]
    fn test_swiss_rematches_only_when_unavoidable(
        ratings in prop::collection::vec(0u32..2400, 2..=9),
        results in prop::collection::vec(any::<u8>(), 40),
        rounds in 1usize..=7,
    ) {
        let mut t = tournament(TournamentFormat::Swiss, &ratings);
        let everyone: Vec<PlayerId> = (1..=ratings.len() as PlayerId).collect();

        for round in 0..rounds {
            let before = PairingHistory::from_games(&t.games);
            let played: HashSet<(PlayerId, PlayerId)> = t
                .games
                .iter()
                .filter_map(|g| g.black_player_id.map(|b| key(g.white_player_id, b)))
                .collect();

            let offset = (round * 5) % results.len();
            let games = play_round(&mut t, &results[offset..]);
            prop_assert_eq!(players_of(&games), everyone.clone());

            let byes: Vec<PlayerId> = games.iter().filter(|g| g.is_bye()).map(|g| g.white_player_id).collect();
            prop_assert_eq!(byes.len(), ratings.len() % 2);
            if let Some(&bye) = byes.first() {
                let fewest = everyone.iter().map(|p| before.bye_count(*p)).min().unwrap();
                prop_assert_eq!(before.bye_count(bye), fewest);
            }

            let paired: Vec<PlayerId> = everyone.iter().copied().filter(|p| !byes.contains(p)).collect();
            let rematches = games
                .iter()
                .filter(|g| g.black_player_id.is_some_and(|b| before.have_played(g.white_player_id, b)))
                .count();
            prop_assert_eq!(rematches, min_rematches(&paired, &played));
        }
    }

    #[test]
    fn test_pairing_is_deterministic(ratings in prop::collection::vec(0u32..2400, 2..=12)) {
        let mut t = tournament(TournamentFormat::Swiss, &ratings);
        play_round(&mut t, &[0, 1, 2, 0, 1, 2]);
        prop_assert_eq!(generate_round(&t, 2).unwrap(), generate_round(&t, 2).unwrap());
    }
}
