// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the keyrack workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The single master record of a store: the fingerprint of the derived key
/// plus the KDF inputs needed to re-derive it.
///
/// The iteration count in force at init/rotation time is persisted next to
/// the salt so verification always derives with the exact parameters the
/// stored fingerprint was produced with, even if configuration changes later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterRecord {
    /// SHA-256 of the derived key. Never the key itself.
    pub password_hash: Vec<u8>,
    /// Random per-store KDF salt, replaced only on rotation.
    pub salt: [u8; 16],
    /// PBKDF2 iteration count used to produce `password_hash`.
    pub kdf_iterations: u32,
}

/// One encrypted credential as persisted: the plaintext password exists
/// only inside [`PlainCredential`] during an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub service: String,
    pub username: String,
    /// Opaque envelope: `nonce(12) ‖ tag(16) ‖ ciphertext`.
    pub envelope: Vec<u8>,
}

/// A decrypted credential triple, used by export/import and the CSV codec.
///
/// Holds a plaintext password; instances are transient and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainCredential {
    pub service: String,
    pub username: String,
    pub password: String,
}

/// A (service, username) pair as returned by `list`. Deliberately has no
/// password field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub service: String,
    pub username: String,
}

/// Classification of the persisted store, computed on demand by the
/// integrity probe. Not itself persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StoreState {
    /// No store file exists at the configured path.
    NoStore,
    /// The file exists but holds no master record.
    Uninitialized,
    /// Exactly one master record and a passing integrity check.
    Ready,
    /// Integrity check failed, table presence is inconsistent, or more
    /// than one master record exists. Terminal.
    Corrupted,
}

/// Column a listing may be ordered by. The fixed allow-list keeps user
/// input out of SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SortField {
    Service,
    Username,
}

/// Direction a listing may be ordered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Read-only snapshot returned by the `status` operation.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: StoreState,
    /// Number of stored credentials; zero when the tables do not exist.
    pub credential_count: usize,
}
