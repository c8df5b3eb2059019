use crate::{
    CoreError, CoreResult,
    capture::{CaptureDevice, EncodingProfile},
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::{DateTime, Local};
use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Where a [`CaptureSession`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// No device open.
    Idle,
    /// Device open with the encoding profile applied, not yet recording.
    Armed,
    /// Audio is being written to the artifact.
    Capturing,
    /// The last artifact was finalized and handed out by `stop()`.
    Finalized,
}

/// One recording: the artifact it writes and when it began.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    /// Unique session ID for log correlation.
    pub id: Uuid,
    /// Local file holding the captured audio.
    pub artifact_path: PathBuf,
    /// When capture started.
    pub started_at: Instant,
}

/// Drives a [`CaptureDevice`] through open, start and stop, and names the
/// artifact of each recording.
///
/// Not thread-safe; the controller keeps it behind an async mutex.
pub struct CaptureSession {
    device: Box<dyn CaptureDevice>,
    profile: EncodingProfile,
    artifact_dir: PathBuf,
    phase: CapturePhase,
    current: Option<RecordingSession>,
}

impl CaptureSession {
    /// Creates an idle session writing artifacts into `artifact_dir`.
    pub fn new(
        device: Box<dyn CaptureDevice>,
        profile: EncodingProfile,
        artifact_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            device,
            profile,
            artifact_dir: artifact_dir.into(),
            phase: CapturePhase::Idle,
            current: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Encoding parameters applied to every artifact.
    pub fn profile(&self) -> &EncodingProfile {
        &self.profile
    }

    /// Directory artifacts are written into.
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Opens the device with the fixed profile.
    ///
    /// A no-op returning the current phase when already armed or capturing,
    /// since press gestures may fire more than once.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DeviceUnavailable`] if there is no input device
    /// or the profile cannot be applied.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn open(&mut self) -> CoreResult<CapturePhase> {
        if matches!(self.phase, CapturePhase::Armed | CapturePhase::Capturing) {
            debug!(phase = ?self.phase, "Capture session already open");
            return Ok(self.phase);
        }

        self.device.open(&self.profile)?;
        self.phase = CapturePhase::Armed;

        Ok(self.phase)
    }

    /// Starts writing a new artifact and returns its session ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyRecording`] while capturing (callers treat
    /// it as a no-op), [`CoreError::NotArmed`] before `open()`, or a storage
    /// error if the artifact cannot be created.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<Uuid> {
        match self.phase {
            CapturePhase::Armed => {}
            CapturePhase::Capturing => {
                return Err(CoreError::AlreadyRecording {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            CapturePhase::Idle | CapturePhase::Finalized => {
                return Err(CoreError::NotArmed {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        std::fs::create_dir_all(&self.artifact_dir).map_err(|source| {
            CoreError::StorageError {
                path: self.artifact_dir.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let id = Uuid::new_v4();
        let artifact_path = self
            .artifact_dir
            .join(artifact_file_name(Local::now(), id, &self.profile));

        self.device.record_to(&artifact_path)?;

        info!(session_id = %id, artifact = ?artifact_path, "Capture started");

        self.current = Some(RecordingSession {
            id,
            artifact_path,
            started_at: Instant::now(),
        });
        self.phase = CapturePhase::Capturing;

        Ok(id)
    }

    /// Stops capture, finalizes the artifact and releases the device.
    ///
    /// The artifact is complete and readable when this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotRecording`] when not capturing, or the
    /// device's error if finalizing fails.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> CoreResult<RecordingSession> {
        if self.phase != CapturePhase::Capturing {
            return Err(CoreError::NotRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let finalized = self.device.finalize();
        self.device.close();
        self.phase = CapturePhase::Finalized;

        let session = self.current.take().ok_or(CoreError::NotRecording {
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Err(e) = finalized {
            warn!(session_id = %session.id, artifact = ?session.artifact_path, "Artifact finalize failed");
            return Err(e);
        }

        info!(
            session_id = %session.id,
            duration_ms = session.started_at.elapsed().as_millis(),
            "Capture finalized"
        );

        Ok(session)
    }

    /// Releases the device and returns to [`CapturePhase::Idle`] after a
    /// failed `open()`/`start()`. Any artifact already written is kept.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        if let Some(session) = self.current.take() {
            warn!(session_id = %session.id, artifact = ?session.artifact_path, "Capture abandoned");
        }
        self.device.close();
        self.phase = CapturePhase::Idle;
    }
}

/// `recording-<local time to the millisecond>-<8 hex>.<ext>`.
///
/// The timestamp sorts lexically; the random suffix keeps rapid repeated
/// taps within the same millisecond from colliding.
pub(crate) fn artifact_file_name(
    now: DateTime<Local>,
    id: Uuid,
    profile: &EncodingProfile,
) -> String {
    let token = id.simple().to_string();
    format!(
        "recording-{}-{}.{}",
        now.format("%Y-%m-%d_%H-%M-%S-%3f"),
        &token[..8],
        profile.extension()
    )
}
