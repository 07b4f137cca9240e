//! Memo-Recorder: record voice memos from the console and keep them in a
//! remote recordings store.

mod app;
mod app_command;
mod config;
mod console;
mod error;
mod view;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    console::ConsoleHandler,
    error::{AppError, Result as AppResult},
};

use crate::{app::build_controller, config::Config};

use std::time::Duration;

use tokio::{
    io::BufReader,
    sync::{mpsc, watch},
};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "memo_recorder=debug,memo_recorder_core=debug";

// Blocking stdin reads cannot be cancelled; give them this long before exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate_store_url() {
        error!("Store validation failed: {:?}", e);
        std::process::exit(1);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let controller = match build_controller(&config) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to create session controller: {:?}", e);
                std::process::exit(1);
            }
        };

        let (command_tx, command_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let console = ConsoleHandler::new(command_tx);

        let app = App {
            controller,
            command_rx,
            shutdown_tx,
            active_session: None,
        };

        tokio::join!(
            async move {
                let stdin = BufReader::new(tokio::io::stdin());
                if let Err(e) = console.run(stdin, shutdown_rx).await {
                    error!(error = ?e, "Console handler error");
                }
            },
            async {
                if let Err(e) = app.run().await {
                    error!(error = ?e, "App error");
                }
            }
        );
    });

    rt.shutdown_timeout(SHUTDOWN_GRACE);
}
