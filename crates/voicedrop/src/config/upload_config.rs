use crate::config::{default_endpoint, default_field_name};

use serde::{Deserialize, Serialize};

/// Ingestion endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Absolute http(s) URL receiving the multipart POST.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Form field name carrying the audio file.
    #[serde(default = "default_field_name")]
    pub field_name: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            field_name: default_field_name(),
        }
    }
}
