// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the keyrack credential vault.
//!
//! Layered TOML loading via Figment with `KEYRACK_` environment overrides,
//! plus a validation pass that enforces the KDF hardness floor.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{KdfConfig, KeyrackConfig, StorageConfig};
pub use validation::validate;
