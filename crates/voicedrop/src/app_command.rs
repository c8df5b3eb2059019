use uuid::Uuid;

/// Commands sent from hotkey handler to main application.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// The hotkey went down: start capturing.
    PressStart {
        /// Correlates the press with its release in logs.
        gesture_id: Uuid,
    },
    /// The hotkey came up: finalize and upload.
    PressEnd {
        /// Gesture ID of the matching press.
        gesture_id: Uuid,
    },
}
