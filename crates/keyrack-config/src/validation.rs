// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic validation of a loaded configuration.

use keyrack_core::VaultError;

use crate::model::KeyrackConfig;

/// Minimum PBKDF2 iteration count accepted in configuration. Below this,
/// brute-forcing the master password becomes too cheap.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Validate a loaded configuration.
///
/// Runs after Figment extraction so that every layer (file, env var) is
/// subject to the same rules.
pub fn validate(config: &KeyrackConfig) -> Result<(), VaultError> {
    if config.kdf.iterations < MIN_KDF_ITERATIONS {
        return Err(VaultError::Usage(format!(
            "kdf.iterations must be at least {MIN_KDF_ITERATIONS}, got {}",
            config.kdf.iterations
        )));
    }
    if config.storage.store_path.trim().is_empty() {
        return Err(VaultError::Usage(
            "storage.store_path must not be empty".to_string(),
        ));
    }
    Ok(())
}
