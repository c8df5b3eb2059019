//! Microphone authorization.
//!
//! A [`PermissionGate`] answers "may we record?" with a tri-state result and
//! prompts the user at most once. [`ConsentGate`] is the stock implementation:
//! it runs a blocking [`ConsentPrompt`] off the async runtime and caches the
//! decision for the lifetime of the process.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{error, info, instrument};

/// Microphone authorization as last reported by a [`PermissionGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// The user has not been asked yet.
    #[default]
    Unknown,
    /// Recording is allowed.
    Granted,
    /// Recording is refused until changed outside the app.
    Denied,
}

/// Queries and requests microphone authorization.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Current authorization, without side effects.
    fn query(&self) -> PermissionState;

    /// Prompts for consent when the state is [`PermissionState::Unknown`].
    ///
    /// Returns immediately, without prompting, once a decision exists.
    async fn request(&self) -> PermissionState;
}

/// Blocking consent dialog. Returns `true` when the user allows recording.
pub trait ConsentPrompt: Send + Sync + 'static {
    /// Shows the prompt and waits for the answer.
    fn ask(&self) -> bool;
}

/// [`PermissionGate`] backed by a [`ConsentPrompt`].
pub struct ConsentGate {
    decision: Mutex<PermissionState>,
    prompt: Arc<dyn ConsentPrompt>,
    // Serializes prompting so concurrent requests share one dialog.
    prompting: tokio::sync::Mutex<()>,
}

impl ConsentGate {
    /// Creates a gate with no decision yet.
    pub fn new(prompt: Arc<dyn ConsentPrompt>) -> Self {
        Self::with_decision(prompt, PermissionState::Unknown)
    }

    /// Creates a gate seeded with a previously persisted decision.
    pub fn with_decision(prompt: Arc<dyn ConsentPrompt>, decision: PermissionState) -> Self {
        Self {
            decision: Mutex::new(decision),
            prompt,
            prompting: tokio::sync::Mutex::new(()),
        }
    }

    fn store(&self, state: PermissionState) {
        let mut decision = self.decision.lock().unwrap_or_else(|e| {
            error!("Permission lock poisoned, recovering: {}", e);
            e.into_inner()
        });
        *decision = state;
    }
}

#[async_trait]
impl PermissionGate for ConsentGate {
    fn query(&self) -> PermissionState {
        *self.decision.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[instrument(skip(self))]
    async fn request(&self) -> PermissionState {
        let current = self.query();
        if current != PermissionState::Unknown {
            return current;
        }

        let _prompting = self.prompting.lock().await;

        // Another request may have settled it while we waited.
        let current = self.query();
        if current != PermissionState::Unknown {
            return current;
        }

        let prompt = Arc::clone(&self.prompt);
        let granted = match tokio::task::spawn_blocking(move || prompt.ask()).await {
            Ok(granted) => granted,
            Err(e) => {
                error!(error = ?e, "Consent prompt task failed");
                false
            }
        };

        let state = if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };
        self.store(state);

        info!(permission = ?state, "Microphone permission resolved");

        state
    }
}
