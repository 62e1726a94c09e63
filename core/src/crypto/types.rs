//! crypto/types.rs
//! Access levels, key material and the crypto error.

use std::fmt;

use num_enum::TryFromPrimitive;
use serde::Serialize;

use crate::constants::{PASSWORD_BYTES, PASSWORD_VALIDATION_FIELD_BYTES};
use crate::headers::UniversalHeader;
use crate::utils::enum_name_or_hex;

/// Stable key length (AES-128).
pub const KEY_LEN_16: usize = PASSWORD_BYTES;

/// Encryption level of a section or record, and the access level a
/// password grants. Level 2 access implies level 1.
#[repr(i8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive, Serialize)]
pub enum AccessLevel {
    None = 0,
    Level1 = 1,
    Level2 = 2,
}

impl AccessLevel {
    /// Level required to read a region whose encryption field is `raw`.
    /// Zero and negative (already decrypted) need no key.
    pub fn required_for(raw: i8) -> Result<Self, CryptoError> {
        if raw <= 0 {
            return Ok(AccessLevel::None);
        }
        Self::try_from_primitive(raw).map_err(|_| CryptoError::UnsupportedEncryption { raw })
    }

    pub fn as_u8(self) -> u8 {
        self as i8 as u8
    }
}

/// Password validation fields copied out of a universal header.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ValidationFields {
    pub level_1: [u8; PASSWORD_VALIDATION_FIELD_BYTES],
    pub level_2: [u8; PASSWORD_VALIDATION_FIELD_BYTES],
}

impl ValidationFields {
    pub fn from_header(h: &UniversalHeader) -> Self {
        Self {
            level_1: h.level_1_password_validation_field,
            level_2: h.level_2_password_validation_field,
        }
    }

    /// False when the file was written without passwords.
    pub fn is_set(&self) -> bool {
        self.level_1.iter().any(|&b| b != 0)
    }
}

impl fmt::Debug for ValidationFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationFields")
            .field("level_1", &hex::encode(self.level_1))
            .field("level_2", &hex::encode(self.level_2))
            .finish()
    }
}

/// AES-128 keys unlocked by the supplied password(s).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    pub(crate) level_1: Option<[u8; KEY_LEN_16]>,
    pub(crate) level_2: Option<[u8; KEY_LEN_16]>,
    /// A password was supplied but matched neither level.
    pub(crate) rejected: bool,
}

impl KeySet {
    /// No password supplied; only unencrypted regions are readable.
    pub fn none() -> Self {
        Self::default()
    }

    /// A password was given and failed validation. Plaintext stays
    /// readable; any encrypted region reports the rejection.
    pub fn rejected() -> Self {
        Self { rejected: true, ..Self::default() }
    }

    pub fn access_level(&self) -> AccessLevel {
        match (self.level_1.is_some(), self.level_2.is_some()) {
            (_, true) => AccessLevel::Level2,
            (true, false) => AccessLevel::Level1,
            (false, false) => AccessLevel::None,
        }
    }

    /// Key for a region encrypted at `level`.
    pub fn key_for(&self, level: AccessLevel) -> Result<&[u8; KEY_LEN_16], CryptoError> {
        let key = match level {
            AccessLevel::None => None,
            AccessLevel::Level1 => self.level_1.as_ref(),
            AccessLevel::Level2 => self.level_2.as_ref(),
        };
        match key {
            Some(key) => Ok(key),
            None if self.rejected => Err(CryptoError::PasswordRejected { level: 0 }),
            None => Err(CryptoError::PasswordRequired { level: level.as_u8() }),
        }
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySet")
            .field("access_level", &self.access_level())
            .field("rejected", &self.rejected)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CryptoError {
    /// Region encrypted at `level`, but no password at that level was given.
    PasswordRequired { level: u8 },

    /// Supplied password fails the validation check at `level`
    /// (0 when it matches neither level).
    PasswordRejected { level: u8 },

    /// Encryption field outside the MEF3 registry.
    UnsupportedEncryption { raw: i8 },

    /// Invalid key length provided to cipher.
    InvalidKeyLen { expected: usize, actual: usize },
}

impl CryptoError {
    /// Level a password error refers to, if this is one.
    pub fn password_level(&self) -> Option<u8> {
        match self {
            CryptoError::PasswordRequired { level } | CryptoError::PasswordRejected { level } => Some(*level),
            _ => None,
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CryptoError::*;
        match self {
            PasswordRequired { level } =>
                write!(f, "level {} password required", level),
            PasswordRejected { level: 0 } =>
                write!(f, "password matches neither level"),
            PasswordRejected { level } =>
                write!(f, "level {} password rejected", level),
            UnsupportedEncryption { raw } =>
                write!(f, "unsupported encryption level: {}",
                       enum_name_or_hex::<AccessLevel>(*raw)),
            InvalidKeyLen { expected, actual } =>
                write!(f, "invalid key length: expected={}, actual={}", expected, actual),
        }
    }
}

impl std::error::Error for CryptoError {}
