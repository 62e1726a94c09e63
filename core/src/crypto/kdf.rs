//! crypto/kdf.rs
//! Password bytes, validation fields and key unlocking.
//!
//! Design:
//! - Password bytes: the terminal byte of each UTF-8 character, at most 16
//!   characters, zero padded. The bytes are the AES-128 key of their level.
//! - Level 1 field = SHA-256(L1)[..16].
//! - Level 2 field = SHA-256(L2)[..16] XOR L1, so a level 2 password alone
//!   recovers the level 1 key.
//! - Passwords are checked against the fields before any decryption.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::constants::{PASSWORD_BYTES, PASSWORD_VALIDATION_FIELD_BYTES};
use crate::crypto::types::{CryptoError, KeySet, ValidationFields, KEY_LEN_16};

/// Reduce a password to its 16 key bytes.
pub fn password_bytes(password: &str) -> [u8; PASSWORD_BYTES] {
    let mut out = [0u8; PASSWORD_BYTES];
    let mut buf = [0u8; 4];
    for (slot, ch) in out.iter_mut().zip(password.chars()) {
        let encoded = ch.encode_utf8(&mut buf);
        *slot = encoded.as_bytes()[encoded.len() - 1];
    }
    out
}

#[inline]
fn hash_16(bytes: &[u8; PASSWORD_BYTES]) -> [u8; PASSWORD_VALIDATION_FIELD_BYTES] {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; PASSWORD_VALIDATION_FIELD_BYTES];
    out.copy_from_slice(&digest[..PASSWORD_VALIDATION_FIELD_BYTES]);
    out
}

#[inline]
fn xor_16(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b)) {
        *o = x ^ y;
    }
    out
}

/// Validation fields a writer stores for the given password pair.
pub fn validation_fields_for(level_1_password: &str, level_2_password: Option<&str>) -> ValidationFields {
    let l1 = password_bytes(level_1_password);
    let level_2 = match level_2_password {
        Some(p) => xor_16(&hash_16(&password_bytes(p)), &l1),
        None => [0u8; PASSWORD_VALIDATION_FIELD_BYTES],
    };
    ValidationFields { level_1: hash_16(&l1), level_2 }
}

fn check_level_1(bytes: &[u8; KEY_LEN_16], fields: &ValidationFields) -> bool {
    hash_16(bytes) == fields.level_1
}

/// Level 1 bytes implied by a level 2 candidate, if the candidate is valid.
fn unlock_level_2(bytes: &[u8; KEY_LEN_16], fields: &ValidationFields) -> Option<[u8; KEY_LEN_16]> {
    let level_1 = xor_16(&hash_16(bytes), &fields.level_2);
    check_level_1(&level_1, fields).then_some(level_1)
}

/// Identify a single password as the level 1 or the level 2 password.
///
/// Files written without passwords yield an empty `KeySet` whatever the
/// password.
pub fn process_password(password: &str, fields: &ValidationFields) -> Result<KeySet, CryptoError> {
    if !fields.is_set() {
        debug!("no password validation fields; password ignored");
        return Ok(KeySet::none());
    }
    let bytes = password_bytes(password);
    if check_level_1(&bytes, fields) {
        return Ok(KeySet { level_1: Some(bytes), level_2: None, rejected: false });
    }
    if let Some(level_1) = unlock_level_2(&bytes, fields) {
        return Ok(KeySet { level_1: Some(level_1), level_2: Some(bytes), rejected: false });
    }
    Err(CryptoError::PasswordRejected { level: 0 })
}

/// Unlock keys from explicitly levelled passwords.
///
/// Errors:
/// - `PasswordRejected { level }` for the first password failing its check.
/// - A level 1 password that disagrees with the one recovered through the
///   level 2 password is rejected at level 1.
pub fn derive_keys(
    level_1_password: Option<&str>,
    level_2_password: Option<&str>,
    fields: &ValidationFields,
) -> Result<KeySet, CryptoError> {
    if level_1_password.is_none() && level_2_password.is_none() {
        return Ok(KeySet::none());
    }
    if !fields.is_set() {
        debug!("no password validation fields; passwords ignored");
        return Ok(KeySet::none());
    }

    let level_1 = match level_1_password.map(password_bytes) {
        Some(b) if check_level_1(&b, fields) => Some(b),
        Some(_) => return Err(CryptoError::PasswordRejected { level: 1 }),
        None => None,
    };

    match level_2_password.map(password_bytes) {
        None => Ok(KeySet { level_1, level_2: None, rejected: false }),
        Some(b2) => {
            let recovered = unlock_level_2(&b2, fields)
                .ok_or(CryptoError::PasswordRejected { level: 2 })?;
            if level_1.is_some_and(|b1| b1 != recovered) {
                return Err(CryptoError::PasswordRejected { level: 1 });
            }
            Ok(KeySet { level_1: Some(recovered), level_2: Some(b2), rejected: false })
        }
    }
}
