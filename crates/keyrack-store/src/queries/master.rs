// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master record operations.

use rusqlite::{params, Connection};

use keyrack_core::{MasterRecord, VaultError};

/// Insert the master record. Called once, inside the `init` transaction.
pub fn insert(conn: &Connection, record: &MasterRecord) -> Result<(), VaultError> {
    conn.execute(
        "INSERT INTO vault_master (password_hash, kdf_salt, kdf_iterations) VALUES (?1, ?2, ?3)",
        params![record.password_hash, record.salt.to_vec(), record.kdf_iterations],
    )
    .map_err(VaultError::storage)?;
    Ok(())
}

/// Read the master record, if any.
///
/// The probe has already ruled out duplication by the time a vault
/// operation reads this, so a bare `LIMIT 1` is safe here.
pub fn get(conn: &Connection) -> Result<Option<MasterRecord>, VaultError> {
    let result = conn.query_row(
        "SELECT password_hash, kdf_salt, kdf_iterations FROM vault_master LIMIT 1",
        [],
        |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, u32>(2)?,
            ))
        },
    );
    match result {
        Ok((password_hash, salt_vec, kdf_iterations)) => {
            let salt: [u8; 16] = salt_vec.try_into().map_err(|_| VaultError::Corrupted {
                reason: "master salt is not 16 bytes".to_string(),
            })?;
            Ok(Some(MasterRecord {
                password_hash,
                salt,
                kdf_iterations,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(VaultError::storage(e)),
    }
}

/// Replace the single master record. Called inside the rotation transaction.
pub fn replace(conn: &Connection, record: &MasterRecord) -> Result<(), VaultError> {
    conn.execute(
        "UPDATE vault_master SET password_hash = ?1, kdf_salt = ?2, kdf_iterations = ?3",
        params![record.password_hash, record.salt.to_vec(), record.kdf_iterations],
    )
    .map_err(VaultError::storage)?;
    Ok(())
}
