use crate::{AppCommand, AppResult, MainCommand, StatusObserver, config::Config};

use std::{sync::Arc, time::Duration};

use tao::event_loop::EventLoopProxy;
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
};
use tracing::{debug, error, info, instrument, warn};
use voicedrop_core::{PermissionState, RecordingController};

/// How long shutdown waits for in-flight uploads.
const UPLOAD_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Main application state.
///
/// Runs on the async runtime thread. Asks the main thread to exit through
/// `main_proxy` because the event loop lives there.
pub struct App {
    pub(crate) controller: Arc<RecordingController>,
    pub(crate) config: Config,
    pub(crate) main_proxy: EventLoopProxy<MainCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("VoiceDrop starting");

        let observer = StatusObserver::new(self.controller.subscribe());
        let observer_handle = tokio::spawn(observer.run(self.shutdown_tx.subscribe()));

        self.resolve_permission().await;

        // Gesture-up work runs off the command loop so a press arriving
        // mid-upload is still seen, and rejected, by the controller.
        let mut uploads = JoinSet::new();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(AppCommand::PressStart { gesture_id }) => {
                            debug!(gesture_id = %gesture_id, "Press start");
                            self.controller.on_press_start().await;
                        }
                        Some(AppCommand::PressEnd { gesture_id }) => {
                            debug!(gesture_id = %gesture_id, "Press end");
                            let controller = Arc::clone(&self.controller);
                            uploads.spawn(async move { controller.on_press_end().await });
                        }
                        None => {
                            info!("Command channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(joined) = uploads.join_next(), if !uploads.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = ?e, "Upload task panicked");
                    }
                }

                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => info!("Ctrl+C received, shutting down"),
                        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
                    }
                    break;
                }
            }
        }

        // A release may still be queued behind the shutdown; finish the
        // recording so its artifact is finalized on disk.
        if self.controller.snapshot().is_recording {
            info!("Finalizing recording in progress before exit");
            let controller = Arc::clone(&self.controller);
            uploads.spawn(async move { controller.on_press_end().await });
        }

        if !uploads.is_empty() {
            info!(in_flight = uploads.len(), "Waiting for uploads to finish");
            let drained = tokio::time::timeout(UPLOAD_DRAIN_TIMEOUT, async {
                while uploads.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                warn!("Uploads still running at exit; their recordings stay on disk");
            }
        }

        let _ = self.shutdown_tx.send(true);
        let _ = observer_handle.await;

        if self.main_proxy.send_event(MainCommand::Shutdown).is_err() {
            debug!("Event loop already closed");
        }

        info!("VoiceDrop shut down successfully");

        Ok(())
    }

    /// Resolve microphone consent and persist a new decision.
    #[instrument(skip(self))]
    async fn resolve_permission(&mut self) {
        let permission = self.controller.ensure_permission().await;

        if permission == PermissionState::Unknown || !self.config.permission.remember(permission) {
            return;
        }

        if let Err(e) = self.config.save() {
            warn!(error = ?e, "Failed to persist microphone decision");
        }
    }
}
