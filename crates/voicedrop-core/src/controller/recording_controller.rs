use crate::{
    CaptureSession, ControllerState, CoreError, PermissionGate, PermissionState, RecordingSession,
    UploadOutcome, UploadTarget, Uploader, upload,
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, instrument, warn};

/// Orchestrates permission, capture, encoding and upload for press-and-hold
/// recording, and publishes a [`ControllerState`] snapshot.
///
/// # Concurrency
///
/// Commands take `&self` so the controller can be shared behind an `Arc`.
/// Capture start and stop are serialized by an async mutex around the
/// [`CaptureSession`]. The gesture-up path flips `is_recording` off and
/// `is_uploading` on in a single state update while still holding that
/// mutex, so a press arriving during an upload always observes the
/// single-flight guard and is rejected.
///
/// All state writes go through one `watch` sender; observers receive whole
/// snapshots and never see a half-applied transition.
pub struct RecordingController {
    gate: Arc<dyn PermissionGate>,
    capture: Mutex<CaptureSession>,
    uploader: Arc<dyn Uploader>,
    target: UploadTarget,
    content_type: &'static str,
    state: watch::Sender<ControllerState>,
}

impl RecordingController {
    /// Creates an idle controller with `permission: Unknown`.
    pub fn new(
        gate: Arc<dyn PermissionGate>,
        capture: CaptureSession,
        uploader: Arc<dyn Uploader>,
        target: UploadTarget,
    ) -> Self {
        let content_type = capture.profile().content_type();
        let (state, _) = watch::channel(ControllerState::default());

        Self {
            gate,
            capture: Mutex::new(capture),
            uploader,
            target,
            content_type,
            state,
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    /// Startup hook: publishes the current authorization and prompts for it
    /// when still unknown.
    ///
    /// A denial is published as `permission: Denied`; it does not stop the
    /// controller from serving other commands.
    #[instrument(skip(self))]
    pub async fn ensure_permission(&self) -> PermissionState {
        let current = self.gate.query();
        self.publish_permission(current);

        let resolved = if current == PermissionState::Unknown {
            let resolved = self.gate.request().await;
            self.publish_permission(resolved);
            resolved
        } else {
            current
        };

        if resolved == PermissionState::Denied {
            warn!("Microphone permission denied; recording disabled until granted externally");
        }

        resolved
    }

    /// Gesture-down: opens and starts a capture session.
    ///
    /// A no-op without permission, while recording, or while an upload is
    /// in flight.
    #[instrument(skip(self))]
    pub async fn on_press_start(&self) {
        let mut capture = self.capture.lock().await;

        let current = self.snapshot();
        if current.permission != PermissionState::Granted {
            debug!(permission = ?current.permission, "Press ignored: no microphone permission");
            return;
        }
        if current.is_recording {
            debug!("Press ignored: already recording");
            return;
        }
        if current.is_uploading {
            info!("Press ignored: previous upload still in flight");
            return;
        }

        match capture.open().and_then(|_| capture.start()) {
            Ok(session_id) => {
                self.state.send_modify(|s| s.is_recording = true);
                info!(session_id = %session_id, "Recording started");
            }
            Err(CoreError::AlreadyRecording { .. }) => {
                debug!("Capture already running, syncing published state");
                self.state.send_modify(|s| s.is_recording = true);
            }
            Err(e) => {
                error!(error = ?e, "Failed to start recording");
                capture.reset();
                let message = e.describe();
                self.state.send_modify(|s| {
                    s.is_recording = false;
                    s.last_error = Some(message);
                });
            }
        }
    }

    /// Gesture-up: stops capture, uploads the artifact and publishes the
    /// outcome. Returns once the session is fully resolved.
    ///
    /// The artifact is deleted only after a successful upload; on any
    /// failure it stays on disk for manual recovery.
    #[instrument(skip(self))]
    pub async fn on_press_end(&self) {
        let session = {
            let mut capture = self.capture.lock().await;

            if !self.state.borrow().is_recording {
                debug!("Release ignored: not recording");
                return;
            }

            match capture.stop() {
                Ok(session) => {
                    self.state.send_modify(|s| {
                        s.is_recording = false;
                        s.is_uploading = true;
                        s.last_error = None;
                    });
                    session
                }
                Err(CoreError::NotRecording { .. }) => {
                    warn!("Release while capture was not running; resetting");
                    self.state.send_modify(|s| {
                        s.is_recording = false;
                        s.is_uploading = false;
                    });
                    return;
                }
                Err(e) => {
                    error!(error = ?e, "Failed to stop recording");
                    let message = e.describe();
                    self.state.send_modify(|s| {
                        s.is_recording = false;
                        s.is_uploading = false;
                        s.last_error = Some(message);
                    });
                    return;
                }
            }
        };

        let result = self.deliver(&session).await;

        self.state.send_modify(|s| {
            s.is_uploading = false;
            s.last_error = result.err();
        });
    }

    /// Reads, encodes and uploads one finalized artifact, deleting it on
    /// success. Returns the user-facing failure message otherwise.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn deliver(&self, session: &RecordingSession) -> Result<(), String> {
        let path = &session.artifact_path;

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                let e = CoreError::FileReadError {
                    path: path.clone(),
                    source,
                    location: ErrorLocation::from(Location::caller()),
                };
                error!(error = ?e, "Artifact unreadable, keeping it for inspection");
                return Err(e.describe());
            }
        };

        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            let outcome = UploadOutcome::EncodingError {
                cause: format!("artifact file name is not valid UTF-8: {:?}", path),
            };
            error!(outcome = %outcome, "Cannot encode upload");
            return Err(outcome.to_string());
        };

        let encoded = upload::encode(&bytes, file_name, &self.target.field_name, self.content_type);
        debug!(
            body_len = encoded.body.len(),
            boundary = encoded.boundary(),
            "Upload body encoded"
        );

        let outcome = self
            .uploader
            .upload(encoded.body, &encoded.content_type, &self.target.endpoint)
            .await;

        if !outcome.is_success() {
            warn!(outcome = %outcome, artifact = ?path, "Upload failed, artifact retained");
            return Err(outcome.to_string());
        }

        info!(artifact = ?path, "Upload succeeded");

        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(artifact = ?path, "Local artifact deleted"),
            Err(e) => error!(artifact = ?path, error = %e, "Failed to delete uploaded artifact"),
        }

        Ok(())
    }

    fn publish_permission(&self, permission: PermissionState) {
        self.state.send_if_modified(|s| {
            let changed = s.permission != permission;
            s.permission = permission;
            changed
        });
    }
}
