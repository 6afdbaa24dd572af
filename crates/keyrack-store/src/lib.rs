// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the keyrack credential vault.
//!
//! Provides an explicit store handle, transactional key-value semantics
//! over the master record and the credential table, and the integrity
//! probe that classifies a store file into the vault state machine.
//!
//! All operations are synchronous; the SQLite transaction is the only
//! atomicity primitive the vault relies on.

pub mod database;
pub mod probe;
pub mod queries;

pub use database::{with_transaction, Database};
pub use probe::probe;
