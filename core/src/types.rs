use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;

use crate::crypto::CryptoError;
use crate::headers::HeaderError;
use crate::records::RecordError;
use crate::telemetry::Stage;
use crate::utils::fmt_bytes;

/// Unified read error covering I/O, codec, crypto and record failures.
/// - `From<T>` impls enable `?` across layers; `at` fills in the location
///   (file or directory) once the caller knows it.
/// - Messages aim to be stable and contextual for diagnostics and logs.
#[derive(Debug)]
pub enum MefError {
    /// Missing file, permission problem, or any other filesystem failure.
    Io { path: PathBuf, source: io::Error },

    /// Stored CRC differs from the computed one.
    Checksum { expected: u32, actual: u32, location: String },

    /// Missing or wrong password for an encrypted region.
    Password { level: u8, location: String },

    /// Malformed structure: truncated file, inconsistent siblings.
    CorruptData { location: String, detail: String },

    /// Known construct with an unhandled version.
    UnsupportedVersion { kind: String, major: u8, minor: u8 },

    /// Record type code outside the registry.
    UnrecognizedType { type_code: [u8; 4] },

    /// Other universal/fixed header failures.
    Header { location: String, source: HeaderError },

    /// Other crypto failures.
    Crypto { location: String, source: CryptoError },

    /// Other record failures.
    Record { location: String, source: RecordError },

    /// Read options that cannot be honoured.
    InvalidOptions(String),
}

/// Field-free mirror of `MefError` variants, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorKind {
    Io,
    Checksum,
    Password,
    CorruptData,
    UnsupportedVersion,
    UnrecognizedType,
    Header,
    Crypto,
    Record,
    InvalidOptions,
}

impl MefError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MefError::Io { .. } => ErrorKind::Io,
            MefError::Checksum { .. } => ErrorKind::Checksum,
            MefError::Password { .. } => ErrorKind::Password,
            MefError::CorruptData { .. } => ErrorKind::CorruptData,
            MefError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            MefError::UnrecognizedType { .. } => ErrorKind::UnrecognizedType,
            MefError::Header { .. } => ErrorKind::Header,
            MefError::Crypto { .. } => ErrorKind::Crypto,
            MefError::Record { .. } => ErrorKind::Record,
            MefError::InvalidOptions(_) => ErrorKind::InvalidOptions,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MefError::Io { path: path.into(), source }
    }

    pub fn corrupt(location: impl Into<String>, detail: impl Into<String>) -> Self {
        MefError::CorruptData { location: location.into(), detail: detail.into() }
    }

    /// Fill in the location if the error does not carry one yet.
    pub fn at(mut self, here: &str) -> Self {
        match &mut self {
            MefError::Checksum { location, .. }
            | MefError::Password { location, .. }
            | MefError::CorruptData { location, .. }
            | MefError::Header { location, .. }
            | MefError::Crypto { location, .. }
            | MefError::Record { location, .. } if location.is_empty() => {
                *location = here.to_string();
            }
            _ => {}
        }
        self
    }

    /// Password errors are fatal to the whole read whatever the failure
    /// policy says.
    pub fn is_password(&self) -> bool {
        matches!(self, MefError::Password { .. })
    }
}

impl fmt::Display for MefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MefError::*;
        match self {
            Io { path, source } =>
                write!(f, "I/O error at {}: {}", path.display(), source),
            Checksum { expected, actual, location } =>
                write!(f, "CRC mismatch at {}: stored 0x{:08x}, computed 0x{:08x}", location, expected, actual),
            Password { level: 0, location } =>
                write!(f, "password rejected at {}", location),
            Password { level, location } =>
                write!(f, "level {} password missing or wrong at {}", level, location),
            CorruptData { location, detail } =>
                write!(f, "corrupt data at {}: {}", location, detail),
            UnsupportedVersion { kind, major, minor } =>
                write!(f, "unsupported {} version {}.{}", kind, major, minor),
            UnrecognizedType { type_code } =>
                write!(f, "unrecognized record type {}", fmt_bytes(type_code)),
            Header { location, source } =>
                write!(f, "header error at {}: {}", location, source),
            Crypto { location, source } =>
                write!(f, "crypto error at {}: {}", location, source),
            Record { location, source } =>
                write!(f, "record error at {}: {}", location, source),
            InvalidOptions(msg) =>
                write!(f, "invalid read options: {}", msg),
        }
    }
}

impl std::error::Error for MefError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MefError::Io { source, .. } => Some(source),
            MefError::Header { source, .. } => Some(source),
            MefError::Crypto { source, .. } => Some(source),
            MefError::Record { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<HeaderError> for MefError {
    fn from(e: HeaderError) -> Self {
        match e {
            HeaderError::ChecksumMismatch { expected, actual } =>
                MefError::Checksum { expected, actual, location: String::new() },
            HeaderError::UnsupportedVersion { major, minor } =>
                MefError::UnsupportedVersion { kind: "MEF".into(), major, minor },
            other => MefError::Header { location: String::new(), source: other },
        }
    }
}

impl From<CryptoError> for MefError {
    fn from(e: CryptoError) -> Self {
        match e.password_level() {
            Some(level) => MefError::Password { level, location: String::new() },
            None => MefError::Crypto { location: String::new(), source: e },
        }
    }
}

impl From<RecordError> for MefError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::ChecksumMismatch { expected, actual } =>
                MefError::Checksum { expected, actual, location: String::new() },
            RecordError::UnrecognizedType { type_code } => MefError::UnrecognizedType { type_code },
            RecordError::UnsupportedVersion { type_code, major, minor } =>
                MefError::UnsupportedVersion { kind: fmt_bytes(&type_code), major, minor },
            other => MefError::Record { location: String::new(), source: other },
        }
    }
}

impl From<serde_json::Error> for MefError {
    fn from(e: serde_json::Error) -> Self {
        MefError::InvalidOptions(e.to_string())
    }
}

/// Attach a location to any error convertible into `MefError`.
pub trait WithLocation<T> {
    fn at(self, location: &str) -> Result<T, MefError>;
}

impl<T, E: Into<MefError>> WithLocation<T> for Result<T, E> {
    fn at(self, location: &str) -> Result<T, MefError> {
        self.map_err(|e| {
            let e: MefError = e.into();
            e.at(location)
        })
    }
}

/// A non-fatal problem reported alongside a best-effort result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Diagnostic {
    /// File or directory the problem was found in.
    pub location: String,
    /// State the reader was in.
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(location: impl Into<String>, stage: Stage, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { location: location.into(), stage, kind, message: message.into() }
    }

    pub fn from_error(stage: Stage, error: &MefError) -> Self {
        let location = match error {
            MefError::Io { path, .. } => path.display().to_string(),
            MefError::Checksum { location, .. }
            | MefError::Password { location, .. }
            | MefError::CorruptData { location, .. }
            | MefError::Header { location, .. }
            | MefError::Crypto { location, .. }
            | MefError::Record { location, .. } => location.clone(),
            _ => String::new(),
        };
        Self { location, stage, kind: error.kind(), message: error.to_string() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.location, self.message)
    }
}
