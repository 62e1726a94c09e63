//! records/types.rs
//! Record header/index layouts, record bodies and the record error.
//!
//! Notes:
//! - A record is a 24-byte header followed by `bytes` of body whose layout
//!   depends on (type code, major, minor).
//! - Only version 1.0 of each body is defined; anything else is kept raw.

use std::fmt;

use num_enum::TryFromPrimitive;
use serde::Serialize;

use crate::constants::*;
use crate::headers::FixedString;
use crate::utils::{enum_name_or_hex, fmt_bytes};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Known record type codes. Discriminants are the four ASCII bytes read as
/// a little-endian u32, as stored in the type string.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize)]
pub enum RecordType {
    Note = u32::from_le_bytes(record_types::NOTE),
    Edfa = u32::from_le_bytes(record_types::EDFA),
    Lntp = u32::from_le_bytes(record_types::LNTP),
    Seiz = u32::from_le_bytes(record_types::SEIZ),
    CSti = u32::from_le_bytes(record_types::CSTI),
    ESti = u32::from_le_bytes(record_types::ESTI),
    SyLg = u32::from_le_bytes(record_types::SYLG),
    Curs = u32::from_le_bytes(record_types::CURS),
    Epoc = u32::from_le_bytes(record_types::EPOC),
}

impl RecordType {
    pub fn verify(code: [u8; 4]) -> Result<Self, RecordError> {
        Self::try_from_primitive(u32::from_le_bytes(code))
            .map_err(|_| RecordError::UnrecognizedType { type_code: code })
    }

    pub fn code(self) -> [u8; 4] {
        (self as u32).to_le_bytes()
    }

    /// Fixed part of the version 1.0 body; variable tails come after it.
    pub const fn fixed_body_bytes(self) -> usize {
        match self {
            RecordType::Note | RecordType::SyLg => 0,
            RecordType::Edfa | RecordType::Lntp => 8,
            RecordType::Seiz => SEIZURE_1_0_BYTES,
            RecordType::CSti => CSTI_1_0_BYTES,
            RecordType::ESti => ESTI_1_0_BYTES,
            RecordType::Curs => CURS_1_0_BYTES,
            RecordType::Epoc => EPOC_1_0_BYTES,
        }
    }
}

pub const SEIZURE_1_0_BYTES: usize = 1152;
pub const SEIZURE_1_0_CHANNEL_BYTES: usize = 272;
pub const SEIZURE_MARKER_NAME_BYTES: usize = 32;
pub const SEIZURE_ANNOTATION_BYTES: usize = 1024;
pub const SEIZURE_RESERVED_BYTES: usize = 32;
pub const SEIZURE_CHANNEL_NAME_BYTES: usize = 256;

pub const CSTI_1_0_BYTES: usize = 200;
pub const CSTI_TEXT_BYTES: usize = 64;

pub const ESTI_1_0_BYTES: usize = 128;
pub const ESTI_TEXT_BYTES: usize = 32;

pub const CURS_1_0_BYTES: usize = 160;
pub const CURS_NAME_BYTES: usize = 128;

pub const EPOC_1_0_BYTES: usize = 192;
pub const EPOC_TYPE_BYTES: usize = 32;
pub const EPOC_TEXT_BYTES: usize = 128;

// ---------------------------------------------------------------------------
// Fixed layouts
// ---------------------------------------------------------------------------

/// Header in front of every record body (24 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RecordHeader {
    /// CRC over bytes 4..24 of this header plus the stored body.
    pub record_crc: u32,                    // 0
    pub type_string: [u8; TYPE_BYTES],      // 4..9
    pub version_major: u8,                  // 9
    pub version_minor: u8,                  // 10
    pub encryption: i8,                     // 11
    /// Body length following the header.
    pub bytes: u32,                         // 12
    pub time: i64,                          // 16
}

impl RecordHeader {
    pub const LEN: usize = RECORD_HEADER_BYTES;

    pub fn new(kind: RecordType, time: i64) -> Self {
        Self {
            type_string: type_string_for(kind.code()),
            version_major: 1,
            version_minor: 0,
            time,
            ..Self::default()
        }
    }

    pub fn type_code(&self) -> [u8; 4] {
        let mut code = [0u8; 4];
        code.copy_from_slice(&self.type_string[..4]);
        code
    }

    pub fn type_name(&self) -> String {
        FixedString::from_bytes(self.type_string).text().into_owned()
    }

    pub fn total_bytes(&self) -> usize {
        Self::LEN + self.bytes as usize
    }
}

/// Summary of one record, stored in the `.ridx` file (24 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RecordIndex {
    pub type_string: [u8; TYPE_BYTES],      // 0..5
    pub version_major: u8,                  // 5
    pub version_minor: u8,                  // 6
    pub encryption: i8,                     // 7
    /// Offset of the record header from the start of the `.rdat` file.
    pub file_offset: i64,                   // 8
    pub time: i64,                          // 16
}

impl RecordIndex {
    pub const LEN: usize = RECORD_INDEX_BYTES;

    /// Index entry describing `header` stored at `file_offset`.
    pub fn for_record(header: &RecordHeader, file_offset: i64) -> Self {
        Self {
            type_string: header.type_string,
            version_major: header.version_major,
            version_minor: header.version_minor,
            encryption: header.encryption,
            file_offset,
            time: header.time,
        }
    }
}

pub(crate) fn type_string_for(code: [u8; 4]) -> [u8; TYPE_BYTES] {
    let mut out = [0u8; TYPE_BYTES];
    out[..4].copy_from_slice(&code);
    out
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeizureChannel {
    pub name: FixedString<SEIZURE_CHANNEL_NAME_BYTES>,
    pub onset: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seizure {
    pub earliest_onset: i64,
    pub latest_offset: i64,
    pub duration: i64,
    pub onset_code: i32,
    pub marker_name_1: FixedString<SEIZURE_MARKER_NAME_BYTES>,
    pub marker_name_2: FixedString<SEIZURE_MARKER_NAME_BYTES>,
    pub annotation: FixedString<SEIZURE_ANNOTATION_BYTES>,
    /// `number_of_channels` on disk is the length of this list.
    pub channels: Vec<SeizureChannel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CognitiveStimulation {
    pub task_type: FixedString<CSTI_TEXT_BYTES>,
    pub stimulus_duration: i64,
    pub stimulus_type: FixedString<CSTI_TEXT_BYTES>,
    pub patient_response: FixedString<CSTI_TEXT_BYTES>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectricalStimulation {
    pub amplitude: f64,
    pub frequency: f64,
    pub pulse_width: i64,
    pub ampunit_code: i32,
    pub mode_code: i32,
    pub waveform: FixedString<ESTI_TEXT_BYTES>,
    pub anode: FixedString<ESTI_TEXT_BYTES>,
    pub catode: FixedString<ESTI_TEXT_BYTES>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cursor {
    pub id_number: i64,
    pub trace_timestamp: i64,
    pub latency: i64,
    pub value: f64,
    pub name: FixedString<CURS_NAME_BYTES>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Epoch {
    pub id_number: i64,
    pub timestamp: i64,
    pub end_timestamp: i64,
    pub duration: i64,
    pub epoch_type: FixedString<EPOC_TYPE_BYTES>,
    pub text: FixedString<EPOC_TEXT_BYTES>,
}

/// Decoded record body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordBody {
    Note { text: String },
    Edfa { duration: i64, annotation: String },
    Lntp { length: i64, template: Vec<i32> },
    Seizure(Seizure),
    CognitiveStimulation(CognitiveStimulation),
    ElectricalStimulation(ElectricalStimulation),
    SystemLog { text: String },
    Cursor(Cursor),
    Epoch(Epoch),
    /// Unknown type, unsupported version, malformed body, or a body that
    /// failed its CRC. `raw` is the body as stored.
    Unrecognized {
        #[serde(with = "serde_bytes_hex")]
        raw: Vec<u8>,
        diagnostic: String,
    },
}

impl RecordBody {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, RecordBody::Unrecognized { .. })
    }
}

mod serde_bytes_hex {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(raw: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(raw))
    }
}

/// One record of a record stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Offset of the record header in its `.rdat` file.
    pub file_offset: i64,
    pub header: RecordHeader,
    pub body: RecordBody,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Type code not in the registry.
    UnrecognizedType { type_code: [u8; 4] },

    /// Known type, version without a decoder.
    UnsupportedVersion { type_code: [u8; 4], major: u8, minor: u8 },

    /// Body shorter than its layout requires.
    Truncated { type_code: [u8; 4], have: usize, need: usize },

    /// Record extends past the end of the data file.
    Overrun { file_offset: i64, record_bytes: usize, file_bytes: usize },

    /// Stored record CRC differs from the computed one.
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Structurally invalid field value with context.
    Invalid(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RecordError::*;
        match self {
            UnrecognizedType { type_code } =>
                write!(f, "unrecognized record type: {} ({})",
                       fmt_bytes(type_code),
                       enum_name_or_hex::<RecordType>(u32::from_le_bytes(*type_code))),
            UnsupportedVersion { type_code, major, minor } =>
                write!(f, "unsupported {} record version: {}.{}", fmt_bytes(type_code), major, minor),
            Truncated { type_code, have, need } =>
                write!(f, "truncated {} record body: {} < {}", fmt_bytes(type_code), have, need),
            Overrun { file_offset, record_bytes, file_bytes } =>
                write!(f, "record at offset {} ({} bytes) overruns data file of {} bytes",
                       file_offset, record_bytes, file_bytes),
            ChecksumMismatch { expected, actual } =>
                write!(f, "record CRC mismatch: stored 0x{:08x}, computed 0x{:08x}", expected, actual),
            Invalid(msg) =>
                write!(f, "invalid record: {}", msg),
        }
    }
}

impl std::error::Error for RecordError {}
