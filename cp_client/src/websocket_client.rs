//! WebSocket session with a live tournament room.

use anyhow::{Context, Result};
use club_pairing::{
    codec,
    messages::{ClientCommand, ServerEvent},
    net::replica::TournamentReplica,
};
use futures_util::{Sink, SinkExt, StreamExt};
use std::{sync::Arc, time::Duration};
use tokio::{
    io::AsyncBufReadExt,
    sync::{Mutex, mpsc},
};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    commands::{HELP, Input, parse_command},
    display,
};

/// How often the session pings the room to stay in its heartbeat window
const PING_INTERVAL: Duration = Duration::from_secs(15);

/// WebSocket room client
pub struct WebSocketClient {
    ws_url: String,
    replica: Arc<Mutex<TournamentReplica>>,
}

impl WebSocketClient {
    /// Create a new WebSocket client
    pub fn new(ws_url: String) -> Self {
        Self {
            ws_url,
            replica: Arc::new(Mutex::new(TournamentReplica::new())),
        }
    }

    /// Shared handle to the local replica
    pub fn replica(&self) -> Arc<Mutex<TournamentReplica>> {
        Arc::clone(&self.replica)
    }

    /// Connect and run an interactive session on stdin until `quit`, EOF,
    /// or the server closing the connection.
    pub async fn connect_and_run(self) -> Result<()> {
        println!("Connecting to {}...", self.ws_url);

        let (ws_stream, _) = connect_async(self.ws_url.as_str())
            .await
            .context("Failed to connect to WebSocket")?;

        println!("Connected! Type 'help' for commands.\n");

        let (mut write, mut read) = ws_stream.split();

        // Read task ends when the server closes the socket
        let (closed_tx, mut closed_rx) = mpsc::channel::<()>(1);
        let replica = self.replica();
        let read_handle = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match codec::decode_event(text.as_str()) {
                        Ok(event) => {
                            let mut replica = replica.lock().await;
                            render_event(&mut replica, &event);
                        }
                        Err(e) => eprintln!("Failed to decode event: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        println!("Server closed connection");
                        break;
                    }
                    Err(e) => {
                        eprintln!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            let _ = closed_tx.send(()).await;
        });

        // `next_line` is cancel safe
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        let mut ping = tokio::time::interval(PING_INTERVAL);
        ping.tick().await;

        loop {
            tokio::select! {
                _ = closed_rx.recv() => break,
                _ = ping.tick() => {
                    if send_command(&mut write, &ClientCommand::Ping).await.is_err() {
                        break;
                    }
                }
                line = lines.next_line() => match line {
                    Ok(None) => break, // EOF
                    Ok(Some(line)) => {
                        let input = line.trim();
                        if input.is_empty() {
                            continue;
                        }
                        match parse_command(input) {
                            Ok(Input::Quit) => {
                                println!("Disconnecting...");
                                break;
                            }
                            Ok(Input::Send(command)) => {
                                if let Err(e) = send_command(&mut write, &command).await {
                                    eprintln!("Error: {}", e);
                                }
                            }
                            Ok(local) => {
                                let replica = self.replica.lock().await;
                                print!("{}", render_local(&replica, &local));
                            }
                            Err(e) => eprintln!("{}", e),
                        }
                    }
                    Err(e) => {
                        eprintln!("Error reading input: {}", e);
                        break;
                    }
                },
            }
        }

        // Clean up
        let _ = write.close().await;
        read_handle.abort();

        Ok(())
    }
}

/// Encode a command and write it as one text frame
pub async fn send_command<W>(write: &mut W, command: &ClientCommand) -> Result<()>
where
    W: Sink<Message> + Unpin,
    W::Error: std::error::Error + Send + Sync + 'static,
{
    let frame = codec::encode_command(command)?;
    write
        .send(Message::Text(frame.into()))
        .await
        .context("Failed to send command")?;
    Ok(())
}

/// Fold an event into the replica and print what changed
fn render_event(replica: &mut TournamentReplica, event: &ServerEvent) {
    if let Err(e) = replica.apply(event) {
        eprintln!("Out of sync: {}. Type 'sync' to resynchronize", e);
        return;
    }

    match event {
        ServerEvent::Pong => {}
        ServerEvent::Error { code, message } => eprintln!("[{}] {}", code, message),
        ServerEvent::FullStateSnapshot { tournament } => {
            println!("{}", display::format_header(tournament));
        }
        ServerEvent::RoundGenerated { round_number, .. } => {
            println!("* {}", event);
            if let Some(tournament) = replica.tournament() {
                print!("{}", display::format_round(tournament, *round_number));
            }
        }
        event => println!("* {}", event),
    }
}

/// Output for commands answered from the replica
fn render_local(replica: &TournamentReplica, input: &Input) -> String {
    if let Input::Help = input {
        return format!("{}\n", HELP);
    }

    let Some(tournament) = replica.tournament() else {
        return "Waiting for the first snapshot\n".to_string();
    };

    match input {
        Input::Standings => {
            format!(
                "{}\n{}",
                display::format_header(tournament),
                display::format_standings(tournament)
            )
        }
        Input::Pairings(round) => {
            display::format_round(tournament, round.unwrap_or(tournament.current_round))
        }
        _ => String::new(),
    }
}
