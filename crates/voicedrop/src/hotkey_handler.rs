//! Global hotkey handler with press-and-hold gesture tracking.
//!
//! Registers CTRL+SHIFT+Space as a global hotkey and turns its pressed and
//! released events into [`AppCommand::PressStart`] / [`AppCommand::PressEnd`].
//! Key auto-repeat delivers extra pressed events while the key is held; those
//! are dropped here so the controller sees one start per gesture.

use crate::{AppCommand, AppError, AppResult, GestureState};

use std::{
    panic::Location,
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Global hotkey handler with gesture state machine.
pub struct HotkeyHandler {
    hotkey_id: u32,
    state: Mutex<GestureState>,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register CTRL+SHIFT+Space as the global hotkey.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkey to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkey() -> AppResult<(GlobalHotKeyManager, u32)> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let hotkey = HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::Space);

        manager
            .register(hotkey)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to register CTRL+SHIFT+Space: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(hotkey = "CTRL+SHIFT+Space", "Global hotkey registered");

        Ok((manager, hotkey.id()))
    }

    /// Create a handler for a previously registered hotkey.
    ///
    /// The `hotkey_id` should come from [`register_hotkey`](Self::register_hotkey).
    /// This struct is `Send` and can live on any thread; it only listens on
    /// the global [`GlobalHotKeyEvent`] channel.
    pub fn new(hotkey_id: u32, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            hotkey_id,
            state: Mutex::new(GestureState::Released),
            command_tx,
        }
    }

    /// Run the hotkey handler event loop.
    ///
    /// This method blocks until a shutdown signal is received.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // One blocking task forwards events from the crossbeam receiver.
        // It exits on the first failed send after event_rx is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if event.id == self.hotkey_id {
                        self.handle_hotkey_event(event.state).await?;
                    }
                }
            }
        }

        drop(event_rx);

        // The blocking task may be parked in recv() until the next hotkey
        // event; the runtime reclaims it on exit.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Advance the gesture state for one hotkey event.
    #[instrument(skip(self))]
    pub(crate) async fn handle_hotkey_event(&self, key_state: HotKeyState) -> AppResult<()> {
        let mut state = self.state.lock().await;

        match (*state, key_state) {
            (GestureState::Released, HotKeyState::Pressed) => {
                let gesture_id = Uuid::new_v4();

                // Send first so a failed send leaves the state untouched.
                self.command_tx
                    .send(AppCommand::PressStart { gesture_id })
                    .await
                    .map_err(|e| AppError::ChannelSendFailed {
                        message: format!("Failed to send PressStart: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                *state = GestureState::Held {
                    pressed_at: Instant::now(),
                    gesture_id,
                };

                debug!(gesture_id = %gesture_id, "Hotkey pressed");
            }
            (
                GestureState::Held {
                    pressed_at,
                    gesture_id,
                },
                HotKeyState::Released,
            ) => {
                self.command_tx
                    .send(AppCommand::PressEnd { gesture_id })
                    .await
                    .map_err(|e| AppError::ChannelSendFailed {
                        message: format!("Failed to send PressEnd: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                *state = GestureState::Released;

                debug!(
                    gesture_id = %gesture_id,
                    held_ms = pressed_at.elapsed().as_millis(),
                    "Hotkey released"
                );
            }
            (GestureState::Held { .. }, HotKeyState::Pressed) => {
                // Auto-repeat.
            }
            (GestureState::Released, HotKeyState::Released) => {
                debug!("Release without matching press ignored");
            }
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn gesture_state(&self) -> GestureState {
        *self.state.lock().await
    }
}
