// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the keyrack credential vault.
//!
//! This crate provides the error taxonomy and the shared types used
//! throughout the keyrack workspace: persisted record shapes, the store
//! state machine, and the sort allow-list for listings.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VaultError;
pub use types::{
    CredentialRecord, ListEntry, MasterRecord, PlainCredential, SortDirection, SortField,
    StatusReport, StoreState,
};
