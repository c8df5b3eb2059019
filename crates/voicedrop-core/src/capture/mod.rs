pub(crate) mod device;
mod profile;
pub(crate) mod session;

pub use {
    device::{CaptureDevice, CpalDevice},
    profile::{DEFAULT_SAMPLE_RATE, EncodingProfile},
    session::{CapturePhase, CaptureSession, RecordingSession},
};
