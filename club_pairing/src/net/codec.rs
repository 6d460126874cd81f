//! JSON text-frame codec for commands and events.
//!
//! Frames are transport independent: the server writes them to WebSocket
//! text messages, tests feed them straight in.

use super::{
    errors::{Result, SerializationError},
    messages::{ClientCommand, ServerEvent},
};
use serde::{Serialize, de::DeserializeOwned};

/// Maximum size of an inbound command frame (64 KiB)
pub const MAX_COMMAND_SIZE: usize = 64 * 1024;

/// Maximum size of an event frame. Snapshots of large events are bigger
/// than any command, so the client side allows more.
pub const MAX_EVENT_SIZE: usize = 8 * 1024 * 1024;

fn decode<T: DeserializeOwned>(frame: &str, max: usize) -> Result<T> {
    if frame.len() > max {
        return Err(SerializationError::MessageTooLarge {
            actual: frame.len(),
            max,
        });
    }
    Ok(serde_json::from_str(frame)?)
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a client command, rejecting oversized or malformed frames
pub fn decode_command(frame: &str) -> Result<ClientCommand> {
    decode(frame, MAX_COMMAND_SIZE)
}

pub fn encode_command(command: &ClientCommand) -> Result<String> {
    let frame = encode(command)?;
    if frame.len() > MAX_COMMAND_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: frame.len(),
            max: MAX_COMMAND_SIZE,
        });
    }
    Ok(frame)
}

pub fn decode_event(frame: &str) -> Result<ServerEvent> {
    decode(frame, MAX_EVENT_SIZE)
}

pub fn encode_event(event: &ServerEvent) -> Result<String> {
    encode(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::GameResult;

    #[test]
    fn test_decode_command() {
        let command = decode_command(r#"{"type":"submit_result","gameId":3,"result":"black_win"}"#).unwrap();
        assert_eq!(
            command,
            ClientCommand::SubmitResult {
                game_id: 3,
                result: GameResult::BlackWin
            }
        );
    }

    #[test]
    fn test_malformed_frames() {
        for frame in ["", "not json", r#"{"type":"launch_rockets"}"#, r#"{"gameId":3}"#] {
            let err = decode_command(frame).unwrap_err();
            assert_eq!(err.code(), "INVALID_MESSAGE", "frame {frame:?}");
        }
    }

    #[test]
    fn test_oversized_frame() {
        let frame = format!(r#"{{"type":"ping","pad":"{}"}}"#, "x".repeat(MAX_COMMAND_SIZE));
        let err = decode_command(&frame).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::MessageTooLarge { max: MAX_COMMAND_SIZE, .. }
        ));
        assert_eq!(err.code(), "MESSAGE_TOO_LARGE");
    }

    #[test]
    fn test_event_frame() {
        let frame = encode_event(&ServerEvent::error("ROUND_INCOMPLETE", "Round 1 still has 2 game(s) without a result")).unwrap();
        assert!(frame.starts_with(r#"{"type":"error""#));
        assert_eq!(
            decode_event(&frame).unwrap(),
            ServerEvent::error("ROUND_INCOMPLETE", "Round 1 still has 2 game(s) without a result")
        );
    }
}
