// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the keyrack credential vault.
//!
//! One variant per failure kind the vault can report. Error messages never
//! contain a decrypted password, the master password, or a derived key, and
//! [`VaultError::Authentication`] renders the same text regardless of why
//! verification failed.

use thiserror::Error;

use crate::types::StoreState;

/// The primary error type used across all keyrack crates.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Malformed invocation (empty master password, unknown sort field).
    /// No mutation was attempted.
    #[error("usage error: {0}")]
    Usage(String),

    /// The store state machine blocks the operation.
    #[error("vault is not initialized")]
    NotReady {
        /// The state the probe observed (`NoStore` or `Uninitialized`).
        state: StoreState,
    },

    /// Master password or envelope tag verification failed. Deliberately
    /// carries no detail about which.
    #[error("authentication failed")]
    Authentication,

    /// A credential with this (service, username) key already exists.
    #[error("credential already exists for {service}/{username}")]
    DuplicateKey { service: String, username: String },

    /// No credential with this (service, username) key exists.
    #[error("no credential found for {service}/{username}")]
    NotFound { service: String, username: String },

    /// Input validation failed (CSV format, control characters).
    #[error("{}", format_validation(.message, .line))]
    Validation {
        message: String,
        /// 1-based line number for CSV errors, where applicable.
        line: Option<usize>,
    },

    /// Storage backend failure (I/O, query, transaction). The transaction
    /// has already been rolled back when this propagates.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The persisted store failed its integrity check. Terminal; nothing
    /// was mutated.
    #[error("vault store is corrupted: {reason}")]
    Corrupted { reason: String },
}

impl VaultError {
    /// Shorthand for a validation error without a line number.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            line: None,
        }
    }

    /// Shorthand for a validation error anchored to a 1-based line number.
    pub fn validation_at(message: impl Into<String>, line: usize) -> Self {
        Self::Validation {
            message: message.into(),
            line: Some(line),
        }
    }

    /// Wrap any error source as a storage error.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }
}

fn format_validation(message: &str, line: &Option<usize>) -> String {
    match line {
        Some(n) => format!("validation error at line {n}: {message}"),
        None => format!("validation error: {message}"),
    }
}
