use voicedrop_core::PermissionState;

use serde::{Deserialize, Serialize};

/// A recorded answer to the microphone consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MicrophoneDecision {
    /// The user allowed recording.
    Granted,
    /// The user refused recording.
    Denied,
}

/// Persisted consent decisions. An absent entry means the user has not
/// been asked yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Answer to the microphone prompt, if one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microphone: Option<MicrophoneDecision>,
}

impl PermissionConfig {
    /// The stored decision as a [`PermissionState`].
    pub fn state(&self) -> PermissionState {
        match self.microphone {
            Some(MicrophoneDecision::Granted) => PermissionState::Granted,
            Some(MicrophoneDecision::Denied) => PermissionState::Denied,
            None => PermissionState::Unknown,
        }
    }

    /// Stores a resolved decision. Returns `true` when the stored value changed.
    pub fn remember(&mut self, state: PermissionState) -> bool {
        let decision = match state {
            PermissionState::Granted => Some(MicrophoneDecision::Granted),
            PermissionState::Denied => Some(MicrophoneDecision::Denied),
            PermissionState::Unknown => return false,
        };
        let changed = self.microphone != decision;
        self.microphone = decision;
        changed
    }
}
