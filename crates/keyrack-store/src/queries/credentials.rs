// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential record operations.
//!
//! Envelopes are hex-encoded into the TEXT `ciphertext` column at this
//! boundary; the rest of the workspace only ever sees raw envelope bytes.

use rusqlite::{ffi, params, Connection};

use keyrack_core::{CredentialRecord, ListEntry, SortDirection, SortField, VaultError};

/// Insert a credential. A primary-key conflict becomes
/// [`VaultError::DuplicateKey`], detected via the structured extended
/// result code rather than error message text.
pub fn insert(conn: &Connection, record: &CredentialRecord) -> Result<(), VaultError> {
    conn.execute(
        "INSERT INTO vault_credentials (service, username, ciphertext) VALUES (?1, ?2, ?3)",
        params![
            record.service,
            record.username,
            hex::encode(&record.envelope)
        ],
    )
    .map_err(|e| map_insert_error(e, &record.service, &record.username))?;
    Ok(())
}

fn map_insert_error(e: rusqlite::Error, service: &str, username: &str) -> VaultError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &e
        && (failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            || failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
    {
        return VaultError::DuplicateKey {
            service: service.to_string(),
            username: username.to_string(),
        };
    }
    VaultError::storage(e)
}

/// Fetch a single credential by its (service, username) key.
pub fn get(
    conn: &Connection,
    service: &str,
    username: &str,
) -> Result<Option<CredentialRecord>, VaultError> {
    let result = conn.query_row(
        "SELECT ciphertext FROM vault_credentials WHERE service = ?1 AND username = ?2",
        params![service, username],
        |row| row.get::<_, String>(0),
    );
    match result {
        Ok(encoded) => Ok(Some(CredentialRecord {
            service: service.to_string(),
            username: username.to_string(),
            envelope: decode_envelope(&encoded)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(VaultError::storage(e)),
    }
}

/// Delete a credential; returns the number of rows removed. Zero deletions
/// is surfaced by the caller as not-found, not as a store error.
pub fn delete(conn: &Connection, service: &str, username: &str) -> Result<usize, VaultError> {
    conn.execute(
        "DELETE FROM vault_credentials WHERE service = ?1 AND username = ?2",
        params![service, username],
    )
    .map_err(VaultError::storage)
}

/// Delete every credential; returns the number of rows removed. Half of the
/// delete-all + insert-all bulk replace used by import and rotation.
pub fn delete_all(conn: &Connection) -> Result<usize, VaultError> {
    conn.execute("DELETE FROM vault_credentials", [])
        .map_err(VaultError::storage)
}

/// List (service, username) pairs ordered by the requested column.
///
/// The (field, direction) pair selects one of four fixed statements; user
/// input is never interpolated into SQL text.
pub fn list(
    conn: &Connection,
    field: SortField,
    direction: SortDirection,
) -> Result<Vec<ListEntry>, VaultError> {
    let sql = match (field, direction) {
        (SortField::Service, SortDirection::Asc) => {
            "SELECT service, username FROM vault_credentials ORDER BY service ASC, username ASC"
        }
        (SortField::Service, SortDirection::Desc) => {
            "SELECT service, username FROM vault_credentials ORDER BY service DESC, username DESC"
        }
        (SortField::Username, SortDirection::Asc) => {
            "SELECT service, username FROM vault_credentials ORDER BY username ASC, service ASC"
        }
        (SortField::Username, SortDirection::Desc) => {
            "SELECT service, username FROM vault_credentials ORDER BY username DESC, service DESC"
        }
    };
    let mut stmt = conn.prepare(sql).map_err(VaultError::storage)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ListEntry {
                service: row.get(0)?,
                username: row.get(1)?,
            })
        })
        .map_err(VaultError::storage)?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(VaultError::storage)?);
    }
    Ok(entries)
}

/// Fetch every credential, ordered by key for deterministic export.
pub fn list_all(conn: &Connection) -> Result<Vec<CredentialRecord>, VaultError> {
    let mut stmt = conn
        .prepare(
            "SELECT service, username, ciphertext FROM vault_credentials
             ORDER BY service ASC, username ASC",
        )
        .map_err(VaultError::storage)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(VaultError::storage)?;
    let mut records = Vec::new();
    for row in rows {
        let (service, username, encoded) = row.map_err(VaultError::storage)?;
        records.push(CredentialRecord {
            service,
            username,
            envelope: decode_envelope(&encoded)?,
        });
    }
    Ok(records)
}

/// Count stored credentials.
pub fn count(conn: &Connection) -> Result<usize, VaultError> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM vault_credentials", [], |row| {
            row.get(0)
        })
        .map_err(VaultError::storage)?;
    Ok(n as usize)
}

fn decode_envelope(encoded: &str) -> Result<Vec<u8>, VaultError> {
    hex::decode(encoded).map_err(|_| VaultError::Corrupted {
        reason: "stored envelope is not valid hex".to_string(),
    })
}
