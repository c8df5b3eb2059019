//! Reports controller state transitions to the user.

use crate::DisplayStatus;

use tokio::sync::watch;
use tracing::{info, instrument, warn};
use voicedrop_core::ControllerState;

/// Watches controller snapshots and logs each visible status change.
pub struct StatusObserver {
    state_rx: watch::Receiver<ControllerState>,
    shown: Option<DisplayStatus>,
    last_error: Option<String>,
}

impl StatusObserver {
    /// Create an observer over the controller's state channel.
    pub fn new(state_rx: watch::Receiver<ControllerState>) -> Self {
        Self {
            state_rx,
            shown: None,
            last_error: None,
        }
    }

    /// Run until shutdown is signalled or the controller is dropped.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let initial = self.state_rx.borrow_and_update().clone();
        self.report(&initial);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                changed = self.state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = self.state_rx.borrow_and_update().clone();
                    self.report(&state);
                }
            }
        }
    }

    fn report(&mut self, state: &ControllerState) {
        if let Some(error) = self.observe_error(state) {
            warn!(error = %error, "Session failed");
        }
        if let Some(status) = self.observe(state) {
            info!(status = ?status, "{}", status.label());
        }
    }

    /// Returns the new status when it differs from the last one shown.
    pub(crate) fn observe(&mut self, state: &ControllerState) -> Option<DisplayStatus> {
        let status = DisplayStatus::from_state(state);
        if self.shown == Some(status) {
            return None;
        }
        self.shown = Some(status);
        Some(status)
    }

    /// Returns a newly published error, once.
    pub(crate) fn observe_error(&mut self, state: &ControllerState) -> Option<String> {
        if state.last_error == self.last_error {
            return None;
        }
        self.last_error = state.last_error.clone();
        self.last_error.clone()
    }
}
