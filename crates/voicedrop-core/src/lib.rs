//! voicedrop core library
//!
//! Press-and-hold microphone capture with upload to an ingestion endpoint,
//! built on CPAL, hound and reqwest.
//!
//! # Example
//!
//! ```no_run
//! use voicedrop_core::{
//!     CaptureSession, ConsentGate, ConsentPrompt, CoreResult, CpalDevice, EncodingProfile,
//!     RecordingController, UploadClient, UploadTarget,
//! };
//!
//! use std::{sync::Arc, time::Duration};
//!
//! struct AlwaysAllow;
//!
//! impl ConsentPrompt for AlwaysAllow {
//!     fn ask(&self) -> bool {
//!         true
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let capture = CaptureSession::new(
//!         Box::new(CpalDevice::new()),
//!         EncodingProfile::default(),
//!         "recordings",
//!     );
//!     let controller = RecordingController::new(
//!         Arc::new(ConsentGate::new(Arc::new(AlwaysAllow))),
//!         capture,
//!         Arc::new(UploadClient::new()?),
//!         UploadTarget::new("http://localhost:8000/tasks/create/"),
//!     );
//!
//!     controller.ensure_permission().await;
//!     controller.on_press_start().await;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     controller.on_press_end().await;
//!
//!     println!("{:?}", controller.snapshot());
//!     Ok(())
//! }
//! ```

mod capture;
mod controller;
mod error;
mod permission;
mod upload;

pub use {
    capture::{
        CaptureDevice, CapturePhase, CaptureSession, CpalDevice, DEFAULT_SAMPLE_RATE,
        EncodingProfile, RecordingSession,
    },
    controller::{ControllerState, RecordingController},
    error::{CoreError, Result as CoreResult},
    permission::{ConsentGate, ConsentPrompt, PermissionGate, PermissionState},
    upload::{
        BOUNDARY_PREFIX, DEFAULT_FIELD_NAME, MultipartBody, UploadClient, UploadOutcome,
        UploadTarget, Uploader, encode as encode_multipart, parse_endpoint,
    },
};

#[cfg(test)]
mod tests;
