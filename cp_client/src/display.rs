//! Plain-text rendering of the local tournament replica.

use club_pairing::tournament::{Game, GameResult, PlayerId, Tournament};
use std::fmt::Write;

/// One-line summary of a tournament
pub fn format_header(tournament: &Tournament) -> String {
    let rounds = match tournament.total_rounds {
        Some(total) => format!("round {}/{}", tournament.current_round, total),
        None => format!("round {}", tournament.current_round),
    };
    format!(
        "#{} {} [{}, {}, {}] {} players",
        tournament.id,
        tournament.name,
        tournament.format,
        tournament.status,
        rounds,
        tournament.active_players().count()
    )
}

/// Standings table ordered by score, rating, then id.
///
/// Withdrawn players keep their row and are marked with `(w)`.
pub fn format_standings(tournament: &Tournament) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<20} {:>6} {:>6} {:>3} {:>3} {:>3}",
        "#", "Player", "Rating", "Score", "W", "D", "L"
    );

    for (rank, player) in tournament.standings().into_iter().enumerate() {
        let name = if player.withdrawn {
            format!("{} (w)", player.nickname)
        } else {
            player.nickname.clone()
        };
        let _ = writeln!(
            out,
            "{:>3}  {:<20} {:>6} {:>6.1} {:>3} {:>3} {:>3}",
            rank + 1,
            name,
            player.rating,
            player.score(),
            player.wins,
            player.draws,
            player.losses
        );
    }

    out
}

/// Pairings of one round, one board per line
pub fn format_round(tournament: &Tournament, round_number: u32) -> String {
    let games: Vec<&Game> = tournament.round_games(round_number).collect();
    if games.is_empty() {
        return format!("Round {} has no pairings\n", round_number);
    }

    let mut out = format!("Round {}\n", round_number);
    for game in games {
        let white = nickname(tournament, game.white_player_id);
        let line = match game.black_player_id {
            Some(black_id) => format!(
                "  game {:<4} {:<20} {:^5} {}",
                game.id,
                white,
                result_cell(game.result),
                nickname(tournament, black_id)
            ),
            None => format!("  game {:<4} {:<20} bye", game.id, white),
        };
        let _ = writeln!(out, "{}", line);
    }

    out
}

fn result_cell(result: GameResult) -> String {
    match result {
        GameResult::Unset => "-".to_string(),
        result => result.to_string(),
    }
}

fn nickname(tournament: &Tournament, player_id: PlayerId) -> String {
    tournament
        .player(player_id)
        .map(|player| player.nickname.clone())
        .unwrap_or_else(|| format!("#{}", player_id))
}
