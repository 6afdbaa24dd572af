// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 key derivation from the master password.
//!
//! Derivation is a deterministic pure function of (password, salt,
//! iterations). What gets persisted is never the key but its SHA-256
//! fingerprint, which lets a later invocation verify a candidate password
//! without the key ever touching disk.

use std::num::NonZeroU32;

use ring::digest::{digest, SHA256};
use ring::pbkdf2::{derive as pbkdf2_derive, PBKDF2_HMAC_SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use keyrack_core::VaultError;

/// Derive a 32-byte key from the master password.
///
/// The returned key is wrapped in [`Zeroizing`] so the memory is cleared
/// on drop; it must never be persisted.
pub fn derive(master: &[u8], salt: &[u8; 16], iterations: NonZeroU32) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2_derive(PBKDF2_HMAC_SHA256, iterations, salt, master, key.as_mut());
    key
}

/// Fast one-way fingerprint of a derived key, stored as the master
/// password hash.
pub fn fingerprint(key: &[u8; 32]) -> Vec<u8> {
    digest(&SHA256, key).as_ref().to_vec()
}

/// Verify a candidate key against the stored fingerprint in constant time.
///
/// Returns a boolean, never an error: callers translate `false` into the
/// single opaque authentication failure.
pub fn verify(key: &[u8; 32], stored_hash: &[u8]) -> bool {
    let candidate = fingerprint(key);
    ring::constant_time::verify_slices_are_equal(&candidate, stored_hash).is_ok()
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> Result<[u8; 16], VaultError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; 16];
    rng.fill(&mut salt).map_err(VaultError::storage)?;
    Ok(salt)
}
