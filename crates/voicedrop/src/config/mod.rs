mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod permission_config;
mod storage_config;
mod upload_config;

pub(crate) use {
    audio_config::AudioConfig,
    config::Config,
    permission_config::{MicrophoneDecision, PermissionConfig},
    storage_config::StorageConfig,
    upload_config::UploadConfig,
};

pub(crate) const DEFAULT_ENDPOINT: &str = "http://localhost:8000/tasks/create/";

pub(crate) fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

pub(crate) fn default_field_name() -> String {
    voicedrop_core::DEFAULT_FIELD_NAME.to_string()
}

pub(crate) fn default_sample_rate() -> u32 {
    voicedrop_core::DEFAULT_SAMPLE_RATE
}
