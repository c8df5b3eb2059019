use std::time::Instant;

use uuid::Uuid;

/// Press-and-hold state for the hotkey handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// Hotkey is up.
    Released,
    /// Hotkey is held down.
    Held {
        /// When the press began.
        pressed_at: Instant,
        /// Unique gesture ID for log correlation.
        gesture_id: Uuid,
    },
}
