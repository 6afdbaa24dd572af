// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault operations: initialize, authenticate, add, get, delete, list,
//! export, import, rotate-master, status.
//!
//! Every operation probes the store state first, authenticates where the
//! operation requires the master password, and performs its mutation
//! inside one transaction. The derived key exists only for the duration
//! of a single operation and is zeroed on drop.

use std::io::Write;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use zeroize::Zeroizing;

use keyrack_config::KeyrackConfig;
use keyrack_core::{
    CredentialRecord, ListEntry, MasterRecord, PlainCredential, SortDirection, SortField,
    StatusReport, StoreState, VaultError,
};
use keyrack_store::{probe, queries, with_transaction, Database};

use crate::{crypto, csv, kdf};

/// Caller's decision when an export target already exists. Obtained from
/// the `on_conflict` callback before any byte is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportConflictChoice {
    /// Replace the existing file.
    Overwrite,
    /// Write to an automatically chosen sibling path (`name-1.csv`, ...).
    RenameAlternative,
    /// Abort with no side effects.
    Cancel,
}

/// Result of an export operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The CSV was written to this path (the target, or the auto-renamed
    /// alternative).
    Written(PathBuf),
    /// The caller declined to overwrite; nothing was written.
    Cancelled,
}

/// Result of an import operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The store now holds exactly the imported records.
    Replaced { imported: usize },
    /// The caller declined the destructive replace; nothing changed.
    Cancelled,
}

/// Result of a master password rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// Salt, fingerprint, and every ciphertext were replaced.
    Rotated,
    /// Old and new password were identical; nothing was written.
    Unchanged,
}

/// The vault orchestrator. Holds the store handle and the KDF iteration
/// count used when a new master record is written.
#[derive(Debug)]
pub struct Vault {
    db: Database,
    kdf_iterations: u32,
}

impl Vault {
    /// Build a vault over an explicit store handle.
    pub fn new(db: Database, kdf_iterations: u32) -> Self {
        Self { db, kdf_iterations }
    }

    /// Build a vault from loaded configuration.
    pub fn from_config(config: &KeyrackConfig) -> Self {
        Self::new(
            Database::new(config.storage.store_path.clone()),
            config.kdf.iterations,
        )
    }

    /// The store path this vault operates on.
    pub fn store_path(&self) -> &Path {
        self.db.path()
    }

    /// Initialize a new store: generate a salt, derive and fingerprint the
    /// key, create the schema, and insert the master record -- one
    /// transaction.
    pub fn init(&self, master: &SecretString) -> Result<(), VaultError> {
        if master.expose_secret().is_empty() {
            return Err(VaultError::Usage(
                "master password must not be empty".to_string(),
            ));
        }
        match probe(self.db.path())? {
            StoreState::NoStore | StoreState::Uninitialized => {}
            StoreState::Ready => {
                return Err(VaultError::Usage(
                    "vault is already initialized".to_string(),
                ));
            }
            StoreState::Corrupted => return Err(corrupted()),
        }

        let salt = kdf::generate_salt()?;
        let iterations = self.iterations()?;
        let key = kdf::derive(master.expose_secret().as_bytes(), &salt, iterations);
        let record = MasterRecord {
            password_hash: kdf::fingerprint(&key),
            salt,
            kdf_iterations: self.kdf_iterations,
        };

        let mut conn = self.db.connect_create()?;
        with_transaction(&mut conn, |tx| {
            keyrack_store::database::create_schema(tx)?;
            // An uninitialized store may carry stray credential rows from
            // outside; they are undecryptable under any key derived here.
            queries::credentials::delete_all(tx)?;
            queries::master::insert(tx, &record)
        })?;
        info!(path = %self.db.path().display(), "vault initialized");
        Ok(())
    }

    /// Encrypt and store one credential.
    pub fn add(
        &self,
        master: &SecretString,
        service: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<(), VaultError> {
        self.require_ready()?;
        reject_control_chars("service", service)?;
        reject_control_chars("username", username)?;

        let mut conn = self.db.connect()?;
        let key = self.authenticate(&conn, master)?;
        let record = CredentialRecord {
            service: service.to_string(),
            username: username.to_string(),
            envelope: crypto::seal(password.expose_secret(), &key)?,
        };
        with_transaction(&mut conn, |tx| queries::credentials::insert(tx, &record))?;
        debug!(service = %service, username = %username, "credential stored");
        Ok(())
    }

    /// Decrypt and return one password.
    pub fn get(
        &self,
        master: &SecretString,
        service: &str,
        username: &str,
    ) -> Result<SecretString, VaultError> {
        self.require_ready()?;
        let conn = self.db.connect_read_only()?;
        let key = self.authenticate(&conn, master)?;
        let record = queries::credentials::get(&conn, service, username)?
            .ok_or_else(|| not_found(service, username))?;
        let plaintext = crypto::open(&record.envelope, &key)?;
        Ok(SecretString::from(plaintext))
    }

    /// Remove one credential.
    pub fn delete(
        &self,
        master: &SecretString,
        service: &str,
        username: &str,
    ) -> Result<(), VaultError> {
        self.require_ready()?;
        let mut conn = self.db.connect()?;
        self.authenticate(&conn, master)?;
        let removed =
            with_transaction(&mut conn, |tx| queries::credentials::delete(tx, service, username))?;
        if removed == 0 {
            return Err(not_found(service, username));
        }
        debug!(service = %service, username = %username, "credential deleted");
        Ok(())
    }

    /// List (service, username) pairs. Requires a ready store but never the
    /// master password; nothing is decrypted.
    pub fn list(
        &self,
        field: SortField,
        direction: SortDirection,
    ) -> Result<Vec<ListEntry>, VaultError> {
        self.require_ready()?;
        let conn = self.db.connect_read_only()?;
        queries::credentials::list(&conn, field, direction)
    }

    /// Decrypt every record and write the canonical CSV to `target`.
    ///
    /// The file is written to a sibling temporary path, synced, then
    /// atomically renamed into place -- a crash mid-write never leaves a
    /// partial target. When `target` already exists, `on_conflict` decides
    /// before any write occurs; [`ExportConflictChoice::Cancel`] leaves the
    /// filesystem untouched.
    pub fn export(
        &self,
        master: &SecretString,
        target: &Path,
        on_conflict: impl FnOnce(&Path) -> ExportConflictChoice,
    ) -> Result<ExportOutcome, VaultError> {
        self.require_ready()?;
        let conn = self.db.connect_read_only()?;
        let key = self.authenticate(&conn, master)?;

        let records = queries::credentials::list_all(&conn)?;
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let password = crypto::open(&record.envelope, &key)?;
            rows.push(PlainCredential {
                service: record.service,
                username: record.username,
                password,
            });
        }
        let text = csv::build(&rows)?;

        let dest = if target.exists() {
            match on_conflict(target) {
                ExportConflictChoice::Overwrite => target.to_path_buf(),
                ExportConflictChoice::RenameAlternative => next_available_path(target),
                ExportConflictChoice::Cancel => return Ok(ExportOutcome::Cancelled),
            }
        } else {
            target.to_path_buf()
        };
        write_atomic(&dest, text.as_bytes())?;
        info!(path = %dest.display(), records = rows.len(), "vault exported");
        Ok(ExportOutcome::Written(dest))
    }

    /// Full destructive replace from a CSV file.
    ///
    /// The file is parsed and completely validated before anything else
    /// happens. When the store already holds records, `confirm_replace`
    /// is asked with the current count and must return `true`; otherwise
    /// the import is cancelled with no side effects. The delete-all plus
    /// insert-all runs in one transaction, so a failure on any record
    /// (for instance a duplicate key inside the file) leaves the prior
    /// data intact.
    pub fn import(
        &self,
        master: &SecretString,
        source: &Path,
        confirm_replace: impl FnOnce(usize) -> bool,
    ) -> Result<ImportOutcome, VaultError> {
        self.require_ready()?;
        let bytes = std::fs::read(source).map_err(VaultError::storage)?;
        let rows = csv::parse(&bytes)?;

        let mut conn = self.db.connect()?;
        let key = self.authenticate(&conn, master)?;

        let existing = queries::credentials::count(&conn)?;
        if existing > 0 && !confirm_replace(existing) {
            debug!("import cancelled by caller before replace");
            return Ok(ImportOutcome::Cancelled);
        }

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(CredentialRecord {
                service: row.service.clone(),
                username: row.username.clone(),
                envelope: crypto::seal(&row.password, &key)?,
            });
        }
        let imported = with_transaction(&mut conn, |tx| {
            queries::credentials::delete_all(tx)?;
            for record in &records {
                queries::credentials::insert(tx, record)?;
            }
            Ok(records.len())
        })?;
        info!(records = imported, "vault imported, full replace");
        Ok(ImportOutcome::Replaced { imported })
    }

    /// Rotate the master password: new salt, new key, every record
    /// re-encrypted, master record replaced -- all in one transaction.
    ///
    /// Identical old and new passwords short-circuit as
    /// [`RotationOutcome::Unchanged`] without writing anything.
    pub fn rotate_master(
        &self,
        old: &SecretString,
        new: &SecretString,
    ) -> Result<RotationOutcome, VaultError> {
        self.require_ready()?;
        if new.expose_secret().is_empty() {
            return Err(VaultError::Usage(
                "new master password must not be empty".to_string(),
            ));
        }
        let mut conn = self.db.connect()?;
        let old_key = self.authenticate(&conn, old)?;
        if old.expose_secret() == new.expose_secret() {
            debug!("rotation with identical password is a no-op");
            return Ok(RotationOutcome::Unchanged);
        }

        // Decrypt the full set before any write; a tampered envelope
        // aborts here with the store untouched.
        let records = queries::credentials::list_all(&conn)?;
        let mut plain = Vec::with_capacity(records.len());
        for record in records {
            let password = Zeroizing::new(crypto::open(&record.envelope, &old_key)?);
            plain.push((record.service, record.username, password));
        }

        let salt = kdf::generate_salt()?;
        let iterations = self.iterations()?;
        let new_key = kdf::derive(new.expose_secret().as_bytes(), &salt, iterations);
        let master = MasterRecord {
            password_hash: kdf::fingerprint(&new_key),
            salt,
            kdf_iterations: self.kdf_iterations,
        };
        let mut resealed = Vec::with_capacity(plain.len());
        for (service, username, password) in &plain {
            resealed.push(CredentialRecord {
                service: service.clone(),
                username: username.clone(),
                envelope: crypto::seal(password.as_str(), &new_key)?,
            });
        }

        with_transaction(&mut conn, |tx| {
            queries::master::replace(tx, &master)?;
            queries::credentials::delete_all(tx)?;
            for record in &resealed {
                queries::credentials::insert(tx, record)?;
            }
            Ok(())
        })?;
        info!(records = resealed.len(), "master password rotated");
        Ok(RotationOutcome::Rotated)
    }

    /// Read-only snapshot: store state plus credential count.
    pub fn status(&self) -> Result<StatusReport, VaultError> {
        let state = probe(self.db.path())?;
        let credential_count = match state {
            StoreState::Ready => {
                let conn = self.db.connect_read_only()?;
                queries::credentials::count(&conn)?
            }
            _ => 0,
        };
        Ok(StatusReport {
            state,
            credential_count,
        })
    }

    fn require_ready(&self) -> Result<(), VaultError> {
        match probe(self.db.path())? {
            StoreState::Ready => Ok(()),
            StoreState::Corrupted => Err(corrupted()),
            state => Err(VaultError::NotReady { state }),
        }
    }

    /// Derive the key for the supplied master password and verify it
    /// against the stored fingerprint, using the salt and iteration count
    /// persisted at init/rotation time.
    fn authenticate(
        &self,
        conn: &Connection,
        master: &SecretString,
    ) -> Result<Zeroizing<[u8; 32]>, VaultError> {
        let record = queries::master::get(conn)?.ok_or_else(|| VaultError::Corrupted {
            reason: "master record missing from ready store".to_string(),
        })?;
        let iterations =
            NonZeroU32::new(record.kdf_iterations).ok_or_else(|| VaultError::Corrupted {
                reason: "stored iteration count is zero".to_string(),
            })?;
        let key = kdf::derive(master.expose_secret().as_bytes(), &record.salt, iterations);
        if !kdf::verify(&key, &record.password_hash) {
            return Err(VaultError::Authentication);
        }
        Ok(key)
    }

    fn iterations(&self) -> Result<NonZeroU32, VaultError> {
        NonZeroU32::new(self.kdf_iterations)
            .ok_or_else(|| VaultError::Usage("kdf iterations must be nonzero".to_string()))
    }
}

fn corrupted() -> VaultError {
    VaultError::Corrupted {
        reason: "store failed its integrity scan".to_string(),
    }
}

fn not_found(service: &str, username: &str) -> VaultError {
    VaultError::NotFound {
        service: service.to_string(),
        username: username.to_string(),
    }
}

fn reject_control_chars(name: &str, value: &str) -> Result<(), VaultError> {
    if value.chars().any(char::is_control) {
        return Err(VaultError::validation(format!(
            "{name} must not contain control characters"
        )));
    }
    Ok(())
}

/// Write `bytes` to a temporary file next to `dest`, sync it, then rename
/// it into place. The temp file lives in the destination directory so the
/// rename stays on one filesystem and is atomic.
fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), VaultError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(VaultError::storage)?;
    tmp.write_all(bytes).map_err(VaultError::storage)?;
    tmp.as_file().sync_all().map_err(VaultError::storage)?;
    tmp.persist(dest)
        .map_err(|e| VaultError::storage(e.error))?;
    Ok(())
}

/// First sibling path of `target` that does not exist yet:
/// `name-1.csv`, `name-2.csv`, ...
fn next_available_path(target: &Path) -> PathBuf {
    let dir = target.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let extension = target.extension().map(|e| e.to_string_lossy().into_owned());
    for i in 1u32.. {
        let name = match &extension {
            Some(ext) => format!("{stem}-{i}.{ext}"),
            None => format!("{stem}-{i}"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("ran out of alternative export paths")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // Far below the production floor, so the tests stay fast; the floor is
    // enforced on configuration, not on this constructor.
    const TEST_ITERATIONS: u32 = 1_000;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn test_vault(dir: &tempfile::TempDir) -> Vault {
        Vault::new(
            Database::new(dir.path().join("vault.db")),
            TEST_ITERATIONS,
        )
    }

    fn ready_vault(dir: &tempfile::TempDir) -> Vault {
        let vault = test_vault(dir);
        vault.init(&secret("Passw0rd!")).unwrap();
        vault
    }

    #[test]
    fn init_makes_store_ready() {
        let dir = tempdir().unwrap();
        let vault = test_vault(&dir);
        assert_eq!(vault.status().unwrap().state, StoreState::NoStore);

        vault.init(&secret("Passw0rd!")).unwrap();

        let report = vault.status().unwrap();
        assert_eq!(report.state, StoreState::Ready);
        assert_eq!(report.credential_count, 0);
    }

    #[test]
    fn init_rejects_empty_master_password() {
        let dir = tempdir().unwrap();
        let vault = test_vault(&dir);
        let err = vault.init(&secret("")).unwrap_err();
        assert!(matches!(err, VaultError::Usage(_)));
        // Nothing was created.
        assert_eq!(vault.status().unwrap().state, StoreState::NoStore);
    }

    #[test]
    fn init_twice_is_a_usage_error() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        let err = vault.init(&secret("other")).unwrap_err();
        assert!(matches!(err, VaultError::Usage(_)));
    }

    #[test]
    fn add_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("s3cret"))
            .unwrap();

        let password = vault.get(&secret("Passw0rd!"), "github", "alice").unwrap();
        assert_eq!(password.expose_secret(), "s3cret");
    }

    #[test]
    fn get_with_wrong_master_is_an_authentication_error() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("s3cret"))
            .unwrap();

        let err = vault.get(&secret("wrong"), "github", "alice").unwrap_err();
        assert!(matches!(err, VaultError::Authentication));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("s3cret"))
            .unwrap();

        vault.delete(&secret("Passw0rd!"), "github", "alice").unwrap();
        let err = vault.get(&secret("Passw0rd!"), "github", "alice").unwrap_err();
        assert!(matches!(err, VaultError::NotFound { .. }));
    }

    #[test]
    fn delete_missing_credential_is_not_found() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        let err = vault
            .delete(&secret("Passw0rd!"), "github", "nobody")
            .unwrap_err();
        assert!(matches!(err, VaultError::NotFound { .. }));
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("one"))
            .unwrap();
        let err = vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("two"))
            .unwrap_err();
        assert!(matches!(err, VaultError::DuplicateKey { .. }));
    }

    #[test]
    fn add_rejects_control_characters_in_key_fields() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        let err = vault
            .add(&secret("Passw0rd!"), "git\thub", "alice", &secret("pw"))
            .unwrap_err();
        assert!(matches!(err, VaultError::Validation { .. }));
        let err = vault
            .add(&secret("Passw0rd!"), "github", "ali\nce", &secret("pw"))
            .unwrap_err();
        assert!(matches!(err, VaultError::Validation { .. }));
    }

    #[test]
    fn operations_before_init_report_not_ready() {
        let dir = tempdir().unwrap();
        let vault = test_vault(&dir);
        let err = vault
            .add(&secret("pw"), "github", "alice", &secret("x"))
            .unwrap_err();
        assert!(matches!(
            err,
            VaultError::NotReady {
                state: StoreState::NoStore
            }
        ));
        assert!(vault
            .list(SortField::Service, SortDirection::Asc)
            .is_err());
        // And the failed operations must not have created a store file.
        assert_eq!(vault.status().unwrap().state, StoreState::NoStore);
    }

    #[test]
    fn list_needs_no_master_password_and_is_ordered() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "mail", "zoe", &secret("a"))
            .unwrap();
        vault
            .add(&secret("Passw0rd!"), "bank", "mia", &secret("b"))
            .unwrap();

        let entries = vault.list(SortField::Service, SortDirection::Asc).unwrap();
        let services: Vec<_> = entries.iter().map(|e| e.service.as_str()).collect();
        assert_eq!(services, ["bank", "mail"]);

        let entries = vault
            .list(SortField::Username, SortDirection::Desc)
            .unwrap();
        let usernames: Vec<_> = entries.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(usernames, ["zoe", "mia"]);
    }

    #[test]
    fn export_writes_canonical_csv() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("s3cret"))
            .unwrap();
        vault
            .add(&secret("Passw0rd!"), "bank", "mia", &secret("hunter2"))
            .unwrap();

        let target = dir.path().join("backup.csv");
        let outcome = vault
            .export(&secret("Passw0rd!"), &target, |_| {
                ExportConflictChoice::Cancel
            })
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Written(target.clone()));

        let text = std::fs::read_to_string(&target).unwrap();
        assert_eq!(
            text,
            "service,username,password\nbank,mia,hunter2\ngithub,alice,s3cret\n"
        );
    }

    #[test]
    fn export_round_trips_through_a_fresh_store() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("s3cret"))
            .unwrap();
        vault
            .add(&secret("Passw0rd!"), "mail", "bob", &secret("hunter2"))
            .unwrap();

        let target = dir.path().join("transfer.csv");
        vault
            .export(&secret("Passw0rd!"), &target, |_| {
                ExportConflictChoice::Cancel
            })
            .unwrap();

        // Import into a brand-new store under a different master password.
        let fresh = Vault::new(
            Database::new(dir.path().join("fresh.db")),
            TEST_ITERATIONS,
        );
        fresh.init(&secret("Different1!")).unwrap();
        let outcome = fresh
            .import(&secret("Different1!"), &target, |_| true)
            .unwrap();
        assert_eq!(outcome, ImportOutcome::Replaced { imported: 2 });

        let pw = fresh.get(&secret("Different1!"), "github", "alice").unwrap();
        assert_eq!(pw.expose_secret(), "s3cret");
        let pw = fresh.get(&secret("Different1!"), "mail", "bob").unwrap();
        assert_eq!(pw.expose_secret(), "hunter2");
    }

    #[test]
    fn export_cancel_leaves_existing_target_untouched() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        let target = dir.path().join("existing.csv");
        std::fs::write(&target, "previous contents").unwrap();

        let outcome = vault
            .export(&secret("Passw0rd!"), &target, |_| {
                ExportConflictChoice::Cancel
            })
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Cancelled);
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "previous contents"
        );
    }

    #[test]
    fn export_overwrite_replaces_existing_target() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        let target = dir.path().join("existing.csv");
        std::fs::write(&target, "previous contents").unwrap();

        let outcome = vault
            .export(&secret("Passw0rd!"), &target, |_| {
                ExportConflictChoice::Overwrite
            })
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Written(target.clone()));
        let text = std::fs::read_to_string(&target).unwrap();
        assert!(text.starts_with("service,username,password\n"));
    }

    #[test]
    fn export_rename_picks_first_free_sibling() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        let target = dir.path().join("backup.csv");
        std::fs::write(&target, "occupied").unwrap();
        std::fs::write(dir.path().join("backup-1.csv"), "also occupied").unwrap();

        let outcome = vault
            .export(&secret("Passw0rd!"), &target, |_| {
                ExportConflictChoice::RenameAlternative
            })
            .unwrap();
        assert_eq!(
            outcome,
            ExportOutcome::Written(dir.path().join("backup-2.csv"))
        );
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "occupied");
    }

    #[test]
    fn import_aborts_on_malformed_file_before_any_deletion() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "keep", "me", &secret("intact"))
            .unwrap();

        let source = dir.path().join("bad.csv");
        std::fs::write(&source, "service,username,password\na,b\n").unwrap();

        let err = vault
            .import(&secret("Passw0rd!"), &source, |_| true)
            .unwrap_err();
        assert!(matches!(err, VaultError::Validation { .. }));

        // The existing record survived.
        let pw = vault.get(&secret("Passw0rd!"), "keep", "me").unwrap();
        assert_eq!(pw.expose_secret(), "intact");
    }

    #[test]
    fn import_without_confirmation_is_cancelled() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "keep", "me", &secret("intact"))
            .unwrap();

        let source = dir.path().join("replacement.csv");
        std::fs::write(&source, "service,username,password\nnew,user,pw\n").unwrap();

        let outcome = vault
            .import(&secret("Passw0rd!"), &source, |existing| {
                assert_eq!(existing, 1);
                false
            })
            .unwrap();
        assert_eq!(outcome, ImportOutcome::Cancelled);
        assert!(vault.get(&secret("Passw0rd!"), "keep", "me").is_ok());
        assert!(vault.get(&secret("Passw0rd!"), "new", "user").is_err());
    }

    #[test]
    fn import_into_empty_store_needs_no_confirmation() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        let source = dir.path().join("records.csv");
        std::fs::write(&source, "service,username,password\nsvc,user,pw\n").unwrap();

        let outcome = vault
            .import(&secret("Passw0rd!"), &source, |_| {
                panic!("confirmation must not be requested for an empty store")
            })
            .unwrap();
        assert_eq!(outcome, ImportOutcome::Replaced { imported: 1 });
    }

    #[test]
    fn import_with_duplicate_rows_rolls_back_entirely() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "keep", "me", &secret("intact"))
            .unwrap();

        let source = dir.path().join("dup.csv");
        std::fs::write(
            &source,
            "service,username,password\nsvc,user,pw1\nsvc,user,pw2\n",
        )
        .unwrap();

        let err = vault
            .import(&secret("Passw0rd!"), &source, |_| true)
            .unwrap_err();
        assert!(matches!(err, VaultError::DuplicateKey { .. }));

        // Prior data intact, imported rows absent.
        assert!(vault.get(&secret("Passw0rd!"), "keep", "me").is_ok());
        assert!(vault.get(&secret("Passw0rd!"), "svc", "user").is_err());
    }

    #[test]
    fn rotation_with_identical_password_changes_nothing() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("s3cret"))
            .unwrap();
        let before = store_snapshot(&dir);

        let outcome = vault
            .rotate_master(&secret("Passw0rd!"), &secret("Passw0rd!"))
            .unwrap();
        assert_eq!(outcome, RotationOutcome::Unchanged);
        assert_eq!(store_snapshot(&dir), before);
    }

    #[test]
    fn rotation_replaces_key_and_preserves_values() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "github", "alice", &secret("s3cret"))
            .unwrap();
        let before = store_snapshot(&dir);

        let outcome = vault
            .rotate_master(&secret("Passw0rd!"), &secret("NewMaster1"))
            .unwrap();
        assert_eq!(outcome, RotationOutcome::Rotated);

        // Old master no longer authenticates; new one decrypts the same value.
        assert!(matches!(
            vault.get(&secret("Passw0rd!"), "github", "alice"),
            Err(VaultError::Authentication)
        ));
        let pw = vault.get(&secret("NewMaster1"), "github", "alice").unwrap();
        assert_eq!(pw.expose_secret(), "s3cret");

        // Salt, hash, and ciphertext all changed.
        let after = store_snapshot(&dir);
        assert_ne!(after.master, before.master);
        assert_ne!(after.ciphertexts, before.ciphertexts);
    }

    #[test]
    fn failed_rotation_leaves_old_key_and_ciphertexts_intact() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        for i in 0..4 {
            vault
                .add(
                    &secret("Passw0rd!"),
                    &format!("service-{i}"),
                    "user",
                    &secret(&format!("password-{i}")),
                )
                .unwrap();
        }
        // Tamper with one envelope so decryption fails partway through the
        // record set.
        tamper_one_ciphertext(&dir, "service-2");
        let before = store_snapshot(&dir);

        let err = vault
            .rotate_master(&secret("Passw0rd!"), &secret("NewMaster1"))
            .unwrap_err();
        assert!(matches!(err, VaultError::Authentication));

        // The store is byte-for-byte as before the attempt, and the old
        // master password still authenticates.
        assert_eq!(store_snapshot(&dir), before);
        let pw = vault.get(&secret("Passw0rd!"), "service-0", "user").unwrap();
        assert_eq!(pw.expose_secret(), "password-0");
    }

    #[test]
    fn rotation_rejects_empty_new_password() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        let err = vault
            .rotate_master(&secret("Passw0rd!"), &secret(""))
            .unwrap_err();
        assert!(matches!(err, VaultError::Usage(_)));
    }

    #[test]
    fn status_counts_credentials() {
        let dir = tempdir().unwrap();
        let vault = ready_vault(&dir);
        vault
            .add(&secret("Passw0rd!"), "a", "x", &secret("1"))
            .unwrap();
        vault
            .add(&secret("Passw0rd!"), "b", "y", &secret("2"))
            .unwrap();

        let report = vault.status().unwrap();
        assert_eq!(report.state, StoreState::Ready);
        assert_eq!(report.credential_count, 2);
    }

    // --- test helpers ---

    /// Raw view of the persisted tables for byte-level comparisons.
    #[derive(Debug, PartialEq)]
    struct Snapshot {
        master: (Vec<u8>, Vec<u8>, u32),
        ciphertexts: Vec<(String, String, String)>,
    }

    fn raw_conn(dir: &tempfile::TempDir) -> rusqlite::Connection {
        rusqlite::Connection::open(dir.path().join("vault.db")).unwrap()
    }

    fn store_snapshot(dir: &tempfile::TempDir) -> Snapshot {
        let conn = raw_conn(dir);
        let master = conn
            .query_row(
                "SELECT password_hash, kdf_salt, kdf_iterations FROM vault_master",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT service, username, ciphertext FROM vault_credentials
                 ORDER BY service, username",
            )
            .unwrap();
        let ciphertexts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .map(Result::unwrap)
            .collect();
        Snapshot {
            master,
            ciphertexts,
        }
    }

    fn tamper_one_ciphertext(dir: &tempfile::TempDir, service: &str) {
        let conn = raw_conn(dir);
        let encoded: String = conn
            .query_row(
                "SELECT ciphertext FROM vault_credentials WHERE service = ?1",
                [service],
                |row| row.get(0),
            )
            .unwrap();
        // Flip the final nibble, keeping the value valid hex.
        let mut chars: Vec<char> = encoded.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        let flipped: String = chars.into_iter().collect();
        conn.execute(
            "UPDATE vault_credentials SET ciphertext = ?1 WHERE service = ?2",
            rusqlite::params![flipped, service],
        )
        .unwrap();
    }
}
