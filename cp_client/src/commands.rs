use club_pairing::{
    messages::ClientCommand,
    tournament::{GameId, GameResult, PlayerId, PlayerProfile},
};
use std::fmt;

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Send a command to the room
    Send(ClientCommand),
    /// Print the standings table from the local replica
    Standings,
    /// Print the pairings of a round (current round when `None`)
    Pairings(Option<u32>),
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A command that needs an argument got none.
    MissingArgument(&'static str),
    /// Not a positive number.
    InvalidNumber(String),
    /// Unknown result notation.
    InvalidResult(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument(usage) => write!(f, "Missing argument. Usage: {}", usage),
            Self::InvalidNumber(value) => {
                write!(f, "Invalid number '{}'. Must be a positive integer", value)
            }
            Self::InvalidResult(value) => write!(
                f,
                "Invalid result '{}'. Use 1-0, 0-1 or 1/2 (or white, black, draw)",
                value
            ),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
Organizer commands:
  start                     Start the tournament and pair round 1
  result GAME 1-0|0-1|1/2   Record or correct a game result
  advance                   Close the round and pair the next one
  finish                    Finish the tournament
  reset                     Discard all games and return to the roster
  add PLAYER                Add a club member by id
  remove PLAYER             Remove (or withdraw) a player
Everyone:
  standings                 Show the standings
  round [N]                 Show the pairings of round N (default: current)
  sync                      Ask the server for a fresh snapshot
  ping                      Check the connection
  help, quit";

/// Parse a command string.
///
/// # Examples
///
/// ```
/// use club_pairing::{messages::ClientCommand, tournament::GameResult};
/// use cp_client::commands::{Input, parse_command};
///
/// assert_eq!(parse_command("start"), Ok(Input::Send(ClientCommand::StartTournament)));
/// assert_eq!(
///     parse_command("result 7 1/2"),
///     Ok(Input::Send(ClientCommand::SubmitResult { game_id: 7, result: GameResult::Draw }))
/// );
/// assert_eq!(parse_command("round"), Ok(Input::Pairings(None)));
/// ```
pub fn parse_command(input: &str) -> Result<Input, ParseError> {
    let trimmed = input.trim();
    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();

    let Some(first) = parts.first() else {
        return Err(ParseError::UnrecognizedCommand(String::new()));
    };

    match first.to_ascii_lowercase().as_str() {
        "start" => Ok(Input::Send(ClientCommand::StartTournament)),
        "advance" | "next" => Ok(Input::Send(ClientCommand::AdvanceRound)),
        "finish" => Ok(Input::Send(ClientCommand::FinishTournament)),
        "reset" => Ok(Input::Send(ClientCommand::ResetTournament)),
        "sync" => Ok(Input::Send(ClientCommand::RequestSnapshot)),
        "ping" => Ok(Input::Send(ClientCommand::Ping)),
        "result" => parse_result_command(&parts),
        "add" => {
            let id = parse_id(parts.get(1), "add PLAYER")?;
            // The server replaces the profile with the directory's record
            Ok(Input::Send(ClientCommand::AddPlayer {
                player: PlayerProfile {
                    id,
                    nickname: String::new(),
                    rating: 0,
                },
            }))
        }
        "remove" => Ok(Input::Send(ClientCommand::RemovePlayer {
            player_id: parse_id(parts.get(1), "remove PLAYER")?,
        })),
        "standings" | "table" => Ok(Input::Standings),
        "round" | "pairings" => match parts.get(1) {
            Some(value) => parse_positive(value).map(|n| Input::Pairings(Some(n as u32))),
            None => Ok(Input::Pairings(None)),
        },
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse "result GAME OUTCOME"
fn parse_result_command(parts: &[&str]) -> Result<Input, ParseError> {
    const USAGE: &str = "result GAME 1-0|0-1|1/2";

    let game_id: GameId = parse_id(parts.get(1), USAGE)?;
    let outcome = parts.get(2).ok_or(ParseError::MissingArgument(USAGE))?;

    Ok(Input::Send(ClientCommand::SubmitResult {
        game_id,
        result: parse_result(outcome)?,
    }))
}

/// Result notation as written on a scoresheet
pub fn parse_result(value: &str) -> Result<GameResult, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "1-0" | "white" | "white_win" => Ok(GameResult::WhiteWin),
        "0-1" | "black" | "black_win" => Ok(GameResult::BlackWin),
        "1/2" | "1/2-1/2" | "½-½" | "draw" => Ok(GameResult::Draw),
        _ => Err(ParseError::InvalidResult(value.to_string())),
    }
}

fn parse_id(value: Option<&&str>, usage: &'static str) -> Result<PlayerId, ParseError> {
    let value = value.ok_or(ParseError::MissingArgument(usage))?;
    parse_positive(value)
}

fn parse_positive(value: &str) -> Result<i64, ParseError> {
    match value.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidNumber(value.to_string())),
    }
}
