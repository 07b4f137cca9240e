//! Line-oriented console input.
//!
//! Reads one command per line and forwards it to the main application over
//! the command channel. Parsing is pure so the command grammar can be tested
//! without a terminal.

use crate::{AppCommand, AppError, AppResult, view};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{mpsc, watch},
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Parse one console line.
///
/// Blank lines yield `Ok(None)`. Command words are case-insensitive; ids are
/// taken verbatim.
pub(crate) fn parse_command(line: &str) -> AppResult<Option<AppCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let invalid = |reason: &str| AppError::InvalidCommand {
        input: line.trim().to_string(),
        reason: reason.to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    if words.next().is_some() {
        return Err(invalid("too many arguments"));
    }

    let command = match (verb.to_ascii_lowercase().as_str(), argument) {
        ("start" | "record", None) => AppCommand::StartRecording {
            session_id: Uuid::new_v4(),
        },
        ("stop", None) => AppCommand::StopRecording,
        ("list" | "ls", None) => AppCommand::ListRecordings,
        ("refresh", None) => AppCommand::Refresh,
        ("delete" | "rm", Some(id)) => AppCommand::Delete { id: id.to_string() },
        ("play", Some(id)) => AppCommand::Play { id: id.to_string() },
        ("delete" | "rm" | "play", None) => return Err(invalid("missing recording id")),
        ("retry", None) => AppCommand::RetryUpload,
        ("help" | "?", None) => AppCommand::Help,
        ("quit" | "exit", None) => AppCommand::Shutdown,
        (
            "start" | "record" | "stop" | "list" | "ls" | "refresh" | "retry" | "help" | "?"
            | "quit" | "exit",
            Some(_),
        ) => return Err(invalid("unexpected argument")),
        _ => return Err(invalid("unknown command")),
    };

    Ok(Some(command))
}

/// Forwards parsed console commands to the application.
pub struct ConsoleHandler {
    command_tx: mpsc::Sender<AppCommand>,
}

impl ConsoleHandler {
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Run the console read loop.
    ///
    /// Returns after `quit`, at end of input (which also requests shutdown),
    /// or when a shutdown signal is received.
    #[instrument(skip(self, input, shutdown_rx))]
    pub async fn run<R>(&self, input: R, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Console handler shutting down");
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Console input closed");
                        self.send(AppCommand::Shutdown).await?;
                        break;
                    };

                    match parse_command(&line) {
                        Ok(Some(command)) => {
                            let is_shutdown = command == AppCommand::Shutdown;
                            self.send(command).await?;
                            if is_shutdown {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(error = %e, "Rejected console input");
                            if let AppError::InvalidCommand { input, reason, .. } = e {
                                println!("{}: {}\n{}", input, reason, view::HELP);
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
