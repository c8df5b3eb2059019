//! Configuration management for voicedrop.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, lazy validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, PermissionConfig, StorageConfig, UploadConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use voicedrop_core::{EncodingProfile, UploadTarget, parse_endpoint};

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Upload endpoint configuration.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Audio capture configuration.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Local artifact storage.
    pub storage: StorageConfig,
    /// Persisted consent decisions.
    #[serde(default)]
    pub permission: PermissionConfig,
}

impl Config {
    /// Load configuration from disk, creating default if not found.
    ///
    /// The endpoint is NOT validated here. Call `validate_endpoint()` to
    /// report a bad value; uploads reject it on their own.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config found, creating default");
            Self::create_default()
        }
    }

    /// Load and parse a configuration file at `path`.
    #[track_caller]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if config.audio.sample_rate == 0 {
            return Err(AppError::ConfigError {
                reason: "audio.sample_rate must be greater than zero".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Check that the upload endpoint is an absolute http(s) URL.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate_endpoint(&self) -> AppResult<()> {
        if parse_endpoint(&self.upload.endpoint).is_none() {
            return Err(AppError::ConfigError {
                reason: format!(
                    "Upload endpoint {:?} is not an absolute http(s) URL. Edit [upload] endpoint in the config file.",
                    self.upload.endpoint
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    /// Save configuration to its platform location.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Defaults with recordings stored under `data_dir`.
    pub fn defaults_in(data_dir: &Path) -> Self {
        Config {
            upload: UploadConfig::default(),
            audio: AudioConfig::default(),
            storage: StorageConfig {
                recordings_dir: data_dir.join("recordings"),
            },
            permission: PermissionConfig::default(),
        }
    }

    /// Capture profile derived from `[audio]`.
    pub fn encoding_profile(&self) -> EncodingProfile {
        EncodingProfile::mono_pcm16(self.audio.sample_rate)
    }

    /// Upload destination derived from `[upload]`.
    pub fn upload_target(&self) -> UploadTarget {
        UploadTarget {
            endpoint: self.upload.endpoint.clone(),
            field_name: self.upload.field_name.clone(),
        }
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "voicedrop", "VoiceDrop").ok_or_else(|| AppError::ConfigError {
            reason: "Failed to get project directories".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    fn create_default() -> AppResult<Self> {
        let proj_dirs = Self::project_dirs()?;
        let config = Self::defaults_in(proj_dirs.data_dir());

        config.save()?;

        warn!(
            endpoint = %config.upload.endpoint,
            recordings_dir = ?config.storage.recordings_dir,
            "Default config created. Point [upload] endpoint at your ingestion server."
        );

        Ok(config)
    }
}
