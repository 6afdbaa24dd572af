// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integrity probe: classifies a store file into the vault state machine.
//!
//! The probe opens the file read-only and never creates or mutates
//! anything, so it is safe to run before every operation, including ones
//! that must fail without side effects.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use keyrack_core::{StoreState, VaultError};

/// Classify the store at `path`.
///
/// - missing file: [`StoreState::NoStore`]
/// - file present, integrity check fails or table presence is inconsistent
///   or more than one master record exists: [`StoreState::Corrupted`]
/// - tables absent or master record missing: [`StoreState::Uninitialized`]
/// - exactly one master record and a passing check: [`StoreState::Ready`]
pub fn probe(path: &Path) -> Result<StoreState, VaultError> {
    if !path.exists() {
        return Ok(StoreState::NoStore);
    }

    let conn = match Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    ) {
        Ok(conn) => conn,
        Err(e) => {
            debug!(error = %e, "probe: store file could not be opened");
            return Ok(StoreState::Corrupted);
        }
    };

    // Structural self-check before trusting any read. A file that is not a
    // SQLite database fails here with SQLITE_NOTADB.
    let check: Result<String, rusqlite::Error> =
        conn.query_row("PRAGMA integrity_check", [], |row| row.get(0));
    match check {
        Ok(result) if result == "ok" => {}
        Ok(result) => {
            debug!(result = %result, "probe: integrity check failed");
            return Ok(StoreState::Corrupted);
        }
        Err(e) => {
            debug!(error = %e, "probe: integrity check could not run");
            return Ok(StoreState::Corrupted);
        }
    }

    let master_present = table_exists(&conn, "vault_master")?;
    let credentials_present = table_exists(&conn, "vault_credentials")?;
    match (master_present, credentials_present) {
        (false, false) => return Ok(StoreState::Uninitialized),
        (true, true) => {}
        // One table without the other means a partially built or externally
        // edited store.
        _ => return Ok(StoreState::Corrupted),
    }

    let master_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM vault_master", [], |row| row.get(0))
        .map_err(VaultError::storage)?;
    Ok(match master_rows {
        0 => StoreState::Uninitialized,
        1 => StoreState::Ready,
        _ => StoreState::Corrupted,
    })
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool, VaultError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .map_err(VaultError::storage)?;
    Ok(count > 0)
}
