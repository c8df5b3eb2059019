mod recording_controller;
mod state;

pub use {recording_controller::RecordingController, state::ControllerState};
