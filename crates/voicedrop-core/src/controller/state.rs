use crate::PermissionState;

/// Observable snapshot published by the
/// [`RecordingController`](crate::RecordingController).
///
/// `is_recording` and `is_uploading` are never both true.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerState {
    /// Last known microphone authorization.
    pub permission: PermissionState,
    /// A capture session is writing audio.
    pub is_recording: bool,
    /// A finalized artifact is being read, encoded or uploaded.
    pub is_uploading: bool,
    /// Human-readable description of the last failure, cleared when a new
    /// upload begins.
    pub last_error: Option<String>,
}

impl ControllerState {
    /// Whether a press gesture would start a recording right now.
    pub fn can_record(&self) -> bool {
        self.permission == PermissionState::Granted && !self.is_recording && !self.is_uploading
    }
}
