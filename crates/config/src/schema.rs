//! Config schema types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default session directory, relative to the working directory.
pub const DEFAULT_SESSIONS_DIR: &str = "data/sessions";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsytechConfig {
    pub storage: StorageConfig,
}

/// Where and how session documents are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per session.
    pub base_path: PathBuf,

    /// Pretty-print documents (indented JSON). Defaults to true.
    pub pretty: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_SESSIONS_DIR),
            pretty: true,
        }
    }
}
