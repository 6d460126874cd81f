use chrono::Utc;
use club_pairing::{
    GameResult, Tournament, TournamentFormat,
    messages::ClientCommand,
    tournament::{NewTournament, PlayerProfile, generate_round},
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn new_tournament(format: TournamentFormat, n_players: i64, total_rounds: Option<u32>) -> Tournament {
    Tournament::from_new(
        1,
        NewTournament {
            name: "bench".to_string(),
            organizer_id: 1,
            format,
            total_rounds,
            players: (1..=n_players)
                .map(|id| PlayerProfile {
                    id,
                    nickname: format!("player{}", id),
                    rating: 1200 + (id as u32 * 37) % 800,
                })
                .collect(),
        },
    )
}

/// Swiss tournament with `rounds` rounds played. White wins on odd boards,
/// the rest are drawn.
fn played_swiss(n_players: i64, rounds: u32) -> Tournament {
    let mut tournament = new_tournament(TournamentFormat::Swiss, n_players, Some(rounds + 1));
    let now = Utc::now();
    tournament.apply(&ClientCommand::StartTournament, now).unwrap();

    for round in 1..=rounds {
        let games: Vec<_> = tournament
            .round_games(round)
            .filter(|g| !g.is_bye())
            .map(|g| g.id)
            .collect();
        for (board, game_id) in games.into_iter().enumerate() {
            let result = if board % 2 == 0 {
                GameResult::WhiteWin
            } else {
                GameResult::Draw
            };
            tournament
                .apply(&ClientCommand::SubmitResult { game_id, result }, now)
                .unwrap();
        }
        if round < rounds {
            tournament.apply(&ClientCommand::AdvanceRound, now).unwrap();
        }
    }

    tournament
}

/// Benchmark the first round of a rated Swiss
fn bench_swiss_first_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("swiss_first_round");

    for n_players in [8, 32, 64].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                let tournament = new_tournament(TournamentFormat::Swiss, n, Some(5));
                b.iter(|| generate_round(&tournament, 1).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark a late Swiss round, where score groups are crowded with rematches
fn bench_swiss_late_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("swiss_late_round");

    for n_players in [16, 64].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                let tournament = played_swiss(n, 5);
                b.iter(|| generate_round(&tournament, 6).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark one round-robin round
fn bench_round_robin(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_robin_round");

    for n_players in [10, 63].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                let tournament = new_tournament(TournamentFormat::RoundRobin, n, None);
                b.iter(|| generate_round(&tournament, 1).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark rebuilding standings from every game
fn bench_recompute_standings(c: &mut Criterion) {
    let tournament = played_swiss(64, 5);

    c.bench_function("recompute_standings_64_players", |b| {
        b.iter_batched(
            || tournament.clone(),
            |mut t| t.recompute_standings(),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(pairing, bench_swiss_first_round, bench_swiss_late_round, bench_round_robin);

criterion_group!(state, bench_recompute_standings);

criterion_main!(pairing, state);
