//! Terminal client for live tournament rooms.
//!
//! Optionally creates a tournament over HTTP, then joins its room over a
//! WebSocket and keeps a local replica in sync from the event stream.

use anyhow::{Context, Result};
use club_pairing::{room::CreateTournament, tournament::TournamentFormat};
use pico_args::Arguments;

use cp_client::{api_client::ApiClient, display, websocket_client::WebSocketClient};

const HELP: &str = "\
Join a live tournament room

USAGE:
  cp_client [OPTIONS] --tournament ID
  cp_client [OPTIONS] --create NAME --players 1,2,3,4

OPTIONS:
  --server URL          Server URL  [default: http://localhost:6970]
  --tournament ID       Tournament to join
  --token JWT           Access token  [default: env CP_TOKEN]; viewers need none
  --create NAME         Create a tournament, then join it
  --format FORMAT       round_robin or swiss  [default: swiss]
  --rounds N            Number of Swiss rounds (adaptive when omitted)
  --players IDS         Comma-separated member ids for the initial roster

FLAGS:
  --show                Print the snapshot and exit instead of joining
  -h, --help            Print help information
";

struct Args {
    server_url: String,
    tournament: Option<i64>,
    token: Option<String>,
    create: Option<String>,
    format: TournamentFormat,
    rounds: Option<u32>,
    players: Vec<i64>,
    show: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server_url: pargs
            .opt_value_from_str("--server")?
            .unwrap_or_else(|| "http://localhost:6970".to_string()),
        tournament: pargs.opt_value_from_str("--tournament")?,
        token: pargs
            .opt_value_from_str("--token")?
            .or_else(|| std::env::var("CP_TOKEN").ok()),
        create: pargs.opt_value_from_str("--create")?,
        format: pargs
            .opt_value_from_fn("--format", parse_format)?
            .unwrap_or(TournamentFormat::Swiss),
        rounds: pargs.opt_value_from_str("--rounds")?,
        players: pargs
            .opt_value_from_fn("--players", parse_ids)?
            .unwrap_or_default(),
        show: pargs.contains("--show"),
    };

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let mut api_client = ApiClient::new(args.server_url.clone());
    if let Some(token) = args.token {
        api_client = api_client.with_token(token);
    }

    let tournament_id = match (args.create, args.tournament) {
        (Some(name), _) => {
            let tournament = api_client
                .create_tournament(&CreateTournament {
                    name,
                    format: args.format,
                    total_rounds: args.rounds,
                    player_ids: args.players,
                })
                .await
                .context("Failed to create tournament")?;
            println!("Created {}", display::format_header(&tournament));
            tournament.id
        }
        (None, Some(id)) => id,
        (None, None) => anyhow::bail!("Pass --tournament ID or --create NAME (see --help)"),
    };

    if args.show {
        let tournament = api_client.snapshot(tournament_id).await?;
        println!("{}", display::format_header(&tournament));
        print!("{}", display::format_standings(&tournament));
        if tournament.current_round > 0 {
            print!(
                "{}",
                display::format_round(&tournament, tournament.current_round)
            );
        }
        return Ok(());
    }

    let ws_client = WebSocketClient::new(api_client.websocket_url(tournament_id));
    ws_client.connect_and_run().await?;

    println!("\nDisconnected from tournament {}.", tournament_id);
    Ok(())
}

fn parse_format(value: &str) -> Result<TournamentFormat, String> {
    match value {
        "swiss" => Ok(TournamentFormat::Swiss),
        "round_robin" | "round-robin" | "rr" => Ok(TournamentFormat::RoundRobin),
        other => Err(format!("unknown format '{}'", other)),
    }
}

fn parse_ids(value: &str) -> Result<Vec<i64>, String> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid player id '{}': {}", part, e))
        })
        .collect()
}
