// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM envelope encryption for individual password values.
//!
//! [`seal`] generates a fresh random 96-bit nonce on every call via the
//! system CSPRNG; there is no way for a caller to supply one. Nonce reuse
//! under the same key would be catastrophic for GCM security.
//!
//! Envelope layout: `nonce(12) ‖ tag(16) ‖ ciphertext`, one opaque blob.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use keyrack_core::VaultError;

/// Length of the GCM nonce at the front of an envelope.
pub const NONCE_LEN: usize = 12;
/// Length of the authentication tag following the nonce.
pub const TAG_LEN: usize = 16;

/// Encrypt a password under the derived key.
///
/// Returns the full envelope `nonce ‖ tag ‖ ciphertext`.
pub fn seal(plaintext: &str, key: &[u8; 32]) -> Result<Vec<u8>, VaultError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(VaultError::storage)?;
    let sealing_key = LessSafeKey::new(unbound);

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes).map_err(VaultError::storage)?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // Seal in place: the buffer is extended with the authentication tag.
    let mut in_out = plaintext.as_bytes().to_vec();
    sealing_key
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(VaultError::storage)?;

    let ciphertext_len = in_out.len() - TAG_LEN;
    let mut envelope = Vec::with_capacity(NONCE_LEN + in_out.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&in_out[ciphertext_len..]);
    envelope.extend_from_slice(&in_out[..ciphertext_len]);
    Ok(envelope)
}

/// Decrypt an envelope produced by [`seal`].
///
/// Any failure -- truncated envelope, wrong key, flipped bit in tag or
/// ciphertext -- surfaces as the single opaque
/// [`VaultError::Authentication`]; garbage is never returned.
pub fn open(envelope: &[u8], key: &[u8; 32]) -> Result<String, VaultError> {
    if envelope.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::Authentication);
    }
    let (nonce_bytes, rest) = envelope.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(VaultError::storage)?;
    let opening_key = LessSafeKey::new(unbound);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| VaultError::Authentication)?;

    // ring expects ciphertext ‖ tag.
    let mut in_out = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    in_out.extend_from_slice(ciphertext);
    in_out.extend_from_slice(tag);

    let plaintext = opening_key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::Authentication)?;

    String::from_utf8(plaintext.to_vec()).map_err(|_| VaultError::Corrupted {
        reason: "decrypted value is not valid UTF-8".to_string(),
    })
}
