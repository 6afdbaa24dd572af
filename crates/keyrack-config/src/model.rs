// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model types with serde defaults.

use serde::{Deserialize, Serialize};

/// Root configuration for keyrack.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyrackConfig {
    /// Store location settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Key derivation settings.
    #[serde(default)]
    pub kdf: KdfConfig,
}

/// Store location configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite store file.
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("keyrack").join("keyrack.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("keyrack.db"))
        .to_string_lossy()
        .into_owned()
}

/// Key derivation configuration.
///
/// The iteration count only applies when a new master record is written
/// (init, rotation); existing stores authenticate with the count persisted
/// next to their salt.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KdfConfig {
    /// PBKDF2-HMAC-SHA256 iteration count (default: 600000, the OWASP
    /// recommendation). Must be at least 100000.
    #[serde(default = "default_kdf_iterations")]
    pub iterations: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            iterations: default_kdf_iterations(),
        }
    }
}

fn default_kdf_iterations() -> u32 {
    600_000
}
