//! crypto/cipher.rs
//! AES-128 over 16-byte blocks of a region.
//!
//! Design notes:
//! - Each full 16-byte block is transformed independently with the level
//!   key; a trailing partial block is stored in clear.
//! - Inputs are never modified; callers get a new buffer (or a borrow when
//!   nothing needed decrypting).

use std::borrow::Cow;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::constants::ENCRYPTION_BLOCK_BYTES;
use crate::crypto::types::{AccessLevel, CryptoError, KeySet, KEY_LEN_16};

fn cipher_for(key: &[u8]) -> Result<Aes128, CryptoError> {
    Aes128::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLen {
        expected: KEY_LEN_16,
        actual: key.len(),
    })
}

/// Decrypt every full block of `bytes` into a new buffer.
pub fn decrypt_region(bytes: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher_for(key)?;
    let mut out = bytes.to_vec();
    for block in out.chunks_exact_mut(ENCRYPTION_BLOCK_BYTES) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(out)
}

/// Inverse of `decrypt_region`.
pub fn encrypt_region(bytes: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher_for(key)?;
    let mut out = bytes.to_vec();
    for block in out.chunks_exact_mut(ENCRYPTION_BLOCK_BYTES) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(out)
}

/// Plaintext of a region whose encryption field is `encryption`.
///
/// Fields <= 0 pass through borrowed.
pub fn decrypt_section<'a>(
    bytes: &'a [u8],
    encryption: i8,
    keys: &KeySet,
) -> Result<Cow<'a, [u8]>, CryptoError> {
    match AccessLevel::required_for(encryption)? {
        AccessLevel::None => Ok(Cow::Borrowed(bytes)),
        level => {
            let key = keys.key_for(level)?;
            decrypt_region(bytes, key).map(Cow::Owned)
        }
    }
}
