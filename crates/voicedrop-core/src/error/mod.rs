use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Capture and storage errors with source location tracking.
///
/// Upload failures are not errors: they are reported as
/// [`UploadOutcome`](crate::UploadOutcome) values so the controller can
/// decide on cleanup.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No input device, or the encoding profile cannot be applied to it.
    #[error("Audio device unavailable: {reason} {location}")]
    DeviceUnavailable {
        /// Description of why the device cannot be used.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// `start()` was called while already capturing.
    #[error("Already recording {location}")]
    AlreadyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// `start()` was called before the session was opened.
    #[error("Capture session is not armed {location}")]
    NotArmed {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// `stop()` was called while not capturing.
    #[error("Not recording {location}")]
    NotRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The finalized artifact could not be read back.
    #[error("Failed to read audio file {path:?}: {source} {location}")]
    FileReadError {
        /// Path of the unreadable artifact.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Creating the artifact directory or file failed.
    #[error("Storage error at {path:?}: {source} {location}")]
    StorageError {
        /// Path that could not be created or written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Writing or finalizing the WAV artifact failed.
    #[error("Artifact write failed: {reason} {location}")]
    ArtifactWriteError {
        /// Description of the write failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client initialization failed: {reason} {location}")]
    HttpClientError {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Short, user-facing description without the source location.
    pub fn describe(&self) -> String {
        match self {
            CoreError::DeviceUnavailable { reason, .. } => {
                format!("Microphone unavailable: {}", reason)
            }
            CoreError::AlreadyRecording { .. } => "Already recording.".to_string(),
            CoreError::NotArmed { .. } => "Recorder was not ready.".to_string(),
            CoreError::NotRecording { .. } => "Not recording.".to_string(),
            CoreError::FileReadError { source, .. } => {
                format!("Failed to read audio file data: {}", source)
            }
            CoreError::StorageError { path, source, .. } => {
                format!("Failed to store recording at {}: {}", path.display(), source)
            }
            CoreError::ArtifactWriteError { reason, .. } => {
                format!("Failed to write recording: {}", reason)
            }
            CoreError::HttpClientError { reason, .. } => {
                format!("HTTP client unavailable: {}", reason)
            }
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
