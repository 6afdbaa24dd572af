// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store handle, connection setup, schema, and transaction boundary.
//!
//! [`Database`] is an explicit handle constructed once and passed by
//! ownership into the vault orchestrator. It holds the store path only;
//! connections are opened per operation so that read-only inspection
//! (the probe) never has to share state with mutating operations.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, Transaction};
use tracing::debug;

use keyrack_core::VaultError;

/// Schema for the two vault tables.
///
/// `vault_master` deliberately carries no single-row constraint: the probe
/// must be able to observe a duplicated master record and classify the
/// store as corrupted.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS vault_master (
    password_hash  BLOB    NOT NULL,
    kdf_salt       BLOB    NOT NULL,
    kdf_iterations INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS vault_credentials (
    service    TEXT NOT NULL,
    username   TEXT NOT NULL,
    ciphertext TEXT NOT NULL,
    PRIMARY KEY (service, username)
);
";

/// Handle to a keyrack store file.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Create a handle for the store at `path`. Does not touch the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store file path this handle points at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a read-write connection to an existing store file.
    ///
    /// Deliberately omits `SQLITE_OPEN_CREATE`: every caller except `init`
    /// runs the probe first, and a missing file must never be conjured into
    /// existence by a read path.
    pub fn connect(&self) -> Result<Connection, VaultError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(VaultError::storage)?;
        configure(&conn)?;
        Ok(conn)
    }

    /// Open a connection, creating parent directories and the store file if
    /// necessary. Used only by `init`.
    pub fn connect_create(&self) -> Result<Connection, VaultError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(VaultError::storage)?;
        }
        let conn = Connection::open(&self.path).map_err(VaultError::storage)?;
        configure(&conn)?;
        debug!(path = %self.path.display(), "store file opened for creation");
        Ok(conn)
    }

    /// Open a read-only connection for inspection (status, probe).
    pub fn connect_read_only(&self) -> Result<Connection, VaultError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(VaultError::storage)
    }
}

/// Session PRAGMAs applied to every read-write connection.
fn configure(conn: &Connection) -> Result<(), VaultError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )
    .map_err(VaultError::storage)
}

/// Execute `f` inside a transaction: commit on `Ok`, roll back on `Err`.
///
/// rusqlite rolls the transaction back when it is dropped uncommitted, so
/// an early `?` inside `f` can never leave a partial mutation behind.
pub fn with_transaction<T>(
    conn: &mut Connection,
    f: impl FnOnce(&Transaction<'_>) -> Result<T, VaultError>,
) -> Result<T, VaultError> {
    let tx = conn.transaction().map_err(VaultError::storage)?;
    let value = f(&tx)?;
    tx.commit().map_err(VaultError::storage)?;
    Ok(value)
}

/// Create both vault tables. Callers run this inside the `init` transaction
/// so that schema creation and the master record land atomically.
pub fn create_schema(tx: &Transaction<'_>) -> Result<(), VaultError> {
    tx.execute_batch(SCHEMA_SQL).map_err(VaultError::storage)
}
