use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local artifact storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding recordings until they are uploaded. Failed uploads
    /// stay here for manual recovery.
    pub recordings_dir: PathBuf,
}
