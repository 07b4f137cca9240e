use crate::{AppCommand, AppError, AppResult, config::Config, view};

use std::panic::Location;

use error_location::ErrorLocation;
use memo_recorder_core::{
    CaptureSession, Clock, CoreError, CpalSource, RecordingRecord, RecordingsList,
    RecordingsStore, SessionController, StoreEndpoint, UploadClient,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Main application state.
///
/// Owns the session controller; every console command and device fault is
/// handled here, one at a time.
pub struct App {
    pub(crate) controller: SessionController,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) active_session: Option<Uuid>,
}

/// Wire the core session controller from configuration.
#[track_caller]
pub(crate) fn build_controller(config: &Config) -> AppResult<SessionController> {
    let endpoint = StoreEndpoint::new(&config.store.base_url, config.store.request_timeout())?;
    let source = CpalSource::new(config.audio.selected_device.clone());

    Ok(SessionController::new(
        CaptureSession::new(Box::new(source)),
        Clock::new(config.session.tick_period()),
        UploadClient::new(endpoint.clone()),
        RecordingsStore::new(endpoint),
    ))
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Memo recorder starting");

        let list_view = spawn_list_view(
            self.controller.subscribe_recordings(),
            self.controller.endpoint().clone(),
        );
        let timer_view = spawn_timer_view(self.controller.subscribe_elapsed());

        if let Err(e) = self.controller.refresh().await {
            report("Initial refresh failed", &e);
        }
        println!("{}", view::HELP);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    let Some(cmd) = cmd else {
                        info!("Command channel closed, shutting down");
                        break;
                    };
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    self.handle_command(cmd).await;
                }

                Some(fault) = self.controller.next_device_fault() => {
                    if let Err(e) = self.controller.handle_device_fault(fault) {
                        let session_id = self.active_session.take();
                        error!(session_id = ?session_id, "Recording aborted");
                        report("Device fault", &e);
                    }
                }
            }
        }

        list_view.abort();
        timer_view.abort();

        let _ = self.shutdown_tx.send(true);
        info!("Memo recorder shut down successfully");

        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn handle_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::StartRecording { session_id } => match self.controller.start() {
                Ok(()) => {
                    self.active_session = Some(session_id);
                    info!(session_id = %session_id, "Recording started");
                    println!("Recording. Type 'stop' to finish.");
                }
                Err(e) => report("Failed to start recording", &e),
            },
            AppCommand::StopRecording => {
                let session_id = self.active_session.take();
                match self.controller.stop().await {
                    Ok(records) => {
                        info!(session_id = ?session_id, saved = records.len(), "Recording saved");
                        announce_saved(&records);
                    }
                    Err(e) => report("Failed to save recording", &e),
                }
            }
            AppCommand::ListRecordings => {
                let records = self.controller.recordings();
                println!(
                    "{}",
                    view::render_recordings(&records, self.controller.endpoint())
                );
            }
            AppCommand::Refresh => {
                if let Err(e) = self.controller.refresh().await {
                    report("Refresh failed", &e);
                }
            }
            AppCommand::Delete { id } => {
                if let Err(e) = self.controller.remove(&id).await {
                    report("Delete failed", &e);
                }
            }
            AppCommand::Play { id } => {
                if let Err(e) = self.play(&id) {
                    error!(id = %id, error = ?e, "Playback failed");
                    println!("Could not open recording '{}'.", id);
                }
            }
            AppCommand::RetryUpload => match self.controller.retry_upload().await {
                Ok(records) => {
                    info!(saved = records.len(), "Retried upload succeeded");
                    announce_saved(&records);
                }
                Err(e) => report("Retry failed", &e),
            },
            AppCommand::Help => println!("{}", view::HELP),
            AppCommand::Shutdown => {}
        }
    }

    #[track_caller]
    fn play(&self, id: &str) -> AppResult<()> {
        let Some(url) = self.controller.playback_url(id) else {
            warn!(id = %id, "Play requested for unknown recording");
            println!("No recording with id '{}'.", id);
            return Ok(());
        };

        open::that(url.as_str()).map_err(|e| AppError::PlaybackFailed {
            reason: format!("Failed to open {}: {}", url, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(url = %url, "Opened recording");
        Ok(())
    }
}

fn announce_saved(records: &[RecordingRecord]) {
    let ids: Vec<String> = records.iter().map(|record| record.id.clone()).collect();
    println!("{}", view::render_saved(&ids));
}

fn report(context: &str, e: &CoreError) {
    error!(error = ?e, "{}", context);
    println!("{}", view::describe_error(e));
}

// Prints the list whenever the store snapshot is replaced.
fn spawn_list_view(
    mut list_rx: watch::Receiver<RecordingsList>,
    endpoint: StoreEndpoint,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while list_rx.changed().await.is_ok() {
            let records = list_rx.borrow_and_update().clone();
            println!("{}", view::render_recordings(&records, &endpoint));
        }
    })
}

fn spawn_timer_view(mut elapsed_rx: watch::Receiver<u64>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while elapsed_rx.changed().await.is_ok() {
            let seconds = *elapsed_rx.borrow_and_update();
            if seconds > 0 {
                println!("{}", view::render_timer(seconds));
            }
        }
    })
}
