// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-password-protected credential vault.
//!
//! The vault stores (service, username) → password triples encrypted at
//! rest with AES-256-GCM under a key stretched from the master password
//! via PBKDF2-HMAC-SHA256. Every mutating operation runs inside a single
//! SQLite transaction: it either fully succeeds or leaves the store
//! exactly as it was.

pub mod crypto;
pub mod csv;
pub mod kdf;
pub mod ops;

pub use ops::{ExportConflictChoice, ExportOutcome, ImportOutcome, RotationOutcome, Vault};
