use voicedrop_core::{ControllerState, PermissionState};

/// User-facing status derived from a [`ControllerState`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    /// Consent has not been given yet.
    AwaitingPermission,
    /// Consent was refused.
    PermissionDenied,
    /// Ready to start recording.
    Ready,
    /// Currently recording audio.
    Recording,
    /// Sending the last recording.
    Uploading,
    /// Idle, but the last session failed at capture, storage or upload.
    Failed,
}

impl DisplayStatus {
    /// Derives the status shown for `state`. Activity outranks errors.
    pub fn from_state(state: &ControllerState) -> Self {
        match state.permission {
            PermissionState::Unknown => return Self::AwaitingPermission,
            PermissionState::Denied => return Self::PermissionDenied,
            PermissionState::Granted => {}
        }

        if state.is_recording {
            Self::Recording
        } else if state.is_uploading {
            Self::Uploading
        } else if state.last_error.is_some() {
            Self::Failed
        } else {
            Self::Ready
        }
    }

    /// Short label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Self::AwaitingPermission => "Waiting for microphone permission",
            Self::PermissionDenied => {
                "Microphone access denied. Set [permission] microphone = \"granted\" in the config to enable recording"
            }
            Self::Ready => "Ready. Hold CTRL+SHIFT+Space to record",
            Self::Recording => "Recording...",
            Self::Uploading => "Uploading...",
            Self::Failed => "Last session failed; see the error above",
        }
    }
}
