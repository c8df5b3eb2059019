use std::io::{self, BufRead, Write};

use tracing::{debug, warn};
use voicedrop_core::ConsentPrompt;

/// Asks for microphone consent on the controlling terminal.
///
/// Blocks on stdin; the consent gate runs it off the async runtime. A closed
/// or unreadable stdin counts as a refusal.
pub struct TerminalPrompt;

impl TerminalPrompt {
    /// Whether `line` is an explicit yes.
    pub(crate) fn parse_answer(line: &str) -> bool {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

impl ConsentPrompt for TerminalPrompt {
    fn ask(&self) -> bool {
        let mut stderr = io::stderr().lock();
        let _ = write!(
            stderr,
            "VoiceDrop needs microphone access to record while the hotkey is held.\nAllow? [y/N] "
        );
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => {
                warn!("stdin closed before consent was given; treating as denied");
                false
            }
            Ok(_) => {
                let allowed = Self::parse_answer(&line);
                debug!(allowed, "Consent answer read");
                allowed
            }
            Err(e) => {
                warn!(error = %e, "Failed to read consent answer; treating as denied");
                false
            }
        }
    }
}
