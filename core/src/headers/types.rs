//! headers/types.rs
//! Universal header, fixed-width field types and the codec error.
//!
//! Notes:
//! - Every MEF3 file starts with the same 1024-byte universal header.
//! - Strings are NUL-terminated UTF-8 inside a fixed byte budget; the whole
//!   budget is kept so that encode reproduces the input byte for byte.
//! - Protected/discretionary regions are opaque and never interpreted.

use std::borrow::Cow;
use std::fmt;

use num_enum::TryFromPrimitive;
use serde::{Serialize, Serializer};

use crate::constants::*;
use crate::index::{TimeSeriesIndex, VideoIndex};
use crate::metadata::{MetadataSection1, MetadataSection3, TimeSeriesSection2, VideoSection2};
use crate::records::{RecordHeader, RecordIndex};
use crate::utils::{enum_name_or_hex, fmt_bytes};

// ---------------------------------------------------------------------------
// Fixed-width strings and opaque regions
// ---------------------------------------------------------------------------

/// NUL-terminated UTF-8 text stored in exactly `N` bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FixedString<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedString<N> {
    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Build from text; at least one trailing NUL must fit.
    pub fn new(text: &str) -> Result<Self, HeaderError> {
        let raw = text.as_bytes();
        if raw.len() >= N {
            return Err(HeaderError::FieldTooLong { have: raw.len(), max: N - 1 });
        }
        let mut bytes = [0u8; N];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Text up to the first NUL (the full budget if there is none).
    pub fn text(&self) -> Cow<'_, str> {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(N);
        String::from_utf8_lossy(&self.bytes[..end])
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.first().map_or(true, |&b| b == 0)
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self { bytes: [0u8; N] }
    }
}

impl<const N: usize> fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text())
    }
}

impl<const N: usize> fmt::Display for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl<const N: usize> Serialize for FixedString<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text())
    }
}

/// Reserved byte span, carried verbatim.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Region<const N: usize>(pub [u8; N]);

impl<const N: usize> Region<N> {
    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl<const N: usize> Default for Region<N> {
    fn default() -> Self {
        Region([0u8; N])
    }
}

impl<const N: usize> fmt::Debug for Region<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zeroed() {
            write!(f, "Region<{}>(zeroed)", N)
        } else {
            write!(f, "Region<{}>(0x{})", N, hex::encode(&self.0[..N.min(16)]))
        }
    }
}

impl<const N: usize> Serialize for Region<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize)]
pub enum ByteOrderCode {
    BigEndian = BIG_ENDIAN_CODE,
    LittleEndian = LITTLE_ENDIAN_CODE,
}

impl ByteOrderCode {
    pub fn verify(raw: u8) -> Result<Self, HeaderError> {
        Self::try_from_primitive(raw).map_err(|_| HeaderError::InvalidByteOrder { raw })
    }
}

/// The seven MEF3 file kinds, identified by the universal header type string.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FileType {
    TimeSeriesMetadata,
    TimeSeriesData,
    TimeSeriesIndices,
    VideoMetadata,
    VideoIndices,
    RecordData,
    RecordIndices,
}

impl FileType {
    pub const ALL: [FileType; 7] = [
        FileType::TimeSeriesMetadata,
        FileType::TimeSeriesData,
        FileType::TimeSeriesIndices,
        FileType::VideoMetadata,
        FileType::VideoIndices,
        FileType::RecordData,
        FileType::RecordIndices,
    ];

    /// File name extension, which doubles as the 4-character type string.
    pub fn extension(self) -> &'static str {
        use crate::constants::extensions::*;
        match self {
            FileType::TimeSeriesMetadata => TIME_SERIES_METADATA_FILE,
            FileType::TimeSeriesData => TIME_SERIES_DATA_FILE,
            FileType::TimeSeriesIndices => TIME_SERIES_INDICES_FILE,
            FileType::VideoMetadata => VIDEO_METADATA_FILE,
            FileType::VideoIndices => VIDEO_INDICES_FILE,
            FileType::RecordData => RECORD_DATA_FILE,
            FileType::RecordIndices => RECORD_INDICES_FILE,
        }
    }

    /// NUL-terminated type string as stored in the universal header.
    pub fn type_string(self) -> [u8; TYPE_BYTES] {
        let mut out = [0u8; TYPE_BYTES];
        out[..4].copy_from_slice(self.extension().as_bytes());
        out
    }

    pub fn from_type_string(raw: &[u8; TYPE_BYTES]) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.extension().as_bytes() == &raw[..4])
    }
}

// ---------------------------------------------------------------------------
// Universal header
// ---------------------------------------------------------------------------

/// Header present at offset 0 of every MEF3 file (1024 bytes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniversalHeader {
    pub header_crc: u32,                                  // 0..4
    pub body_crc: u32,                                    // 4..8
    pub file_type_string: [u8; TYPE_BYTES],               // 8..13
    pub mef_version_major: u8,                            // 13
    pub mef_version_minor: u8,                            // 14
    pub byte_order_code: ByteOrderCode,                   // 15
    pub start_time: i64,                                  // 16..24
    pub end_time: i64,                                    // 24..32
    pub number_of_entries: i64,                           // 32..40
    pub maximum_entry_size: i64,                          // 40..48
    pub segment_number: i32,                              // 48..52
    pub channel_name: FixedString<UH_NAME_BYTES>,         // 52..308
    pub session_name: FixedString<UH_NAME_BYTES>,         // 308..564
    pub anonymized_name: FixedString<UH_NAME_BYTES>,      // 564..820
    pub level_uuid: [u8; UUID_BYTES],                     // 820..836
    pub file_uuid: [u8; UUID_BYTES],                      // 836..852
    pub provenance_uuid: [u8; UUID_BYTES],                // 852..868
    pub level_1_password_validation_field: [u8; PASSWORD_VALIDATION_FIELD_BYTES], // 868..884
    pub level_2_password_validation_field: [u8; PASSWORD_VALIDATION_FIELD_BYTES], // 884..900
    pub protected_region: Region<UH_PROTECTED_REGION_BYTES>,         // 900..960
    pub discretionary_region: Region<UH_DISCRETIONARY_REGION_BYTES>, // 960..1024
}

impl UniversalHeader {
    pub const LEN: usize = UNIVERSAL_HEADER_BYTES;

    /// Empty header of the given file type in little-endian order.
    pub fn new(file_type: FileType) -> Self {
        Self {
            header_crc: 0,
            body_crc: 0,
            file_type_string: file_type.type_string(),
            mef_version_major: MEF_VERSION_MAJOR,
            mef_version_minor: MEF_VERSION_MINOR,
            byte_order_code: ByteOrderCode::LittleEndian,
            start_time: UUTC_NO_ENTRY,
            end_time: UUTC_NO_ENTRY,
            number_of_entries: 0,
            maximum_entry_size: 0,
            segment_number: SEGMENT_NUMBER_NO_ENTRY,
            channel_name: FixedString::default(),
            session_name: FixedString::default(),
            anonymized_name: FixedString::default(),
            level_uuid: [0u8; UUID_BYTES],
            file_uuid: [0u8; UUID_BYTES],
            provenance_uuid: [0u8; UUID_BYTES],
            level_1_password_validation_field: [0u8; PASSWORD_VALIDATION_FIELD_BYTES],
            level_2_password_validation_field: [0u8; PASSWORD_VALIDATION_FIELD_BYTES],
            protected_region: Region::default(),
            discretionary_region: Region::default(),
        }
    }

    pub fn file_type(&self) -> Option<FileType> {
        FileType::from_type_string(&self.file_type_string)
    }

    /// Check the fields every reader depends on.
    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.file_type().is_none() {
            return Err(HeaderError::UnknownFileType { raw: self.file_type_string });
        }
        if self.mef_version_major != MEF_VERSION_MAJOR {
            return Err(HeaderError::UnsupportedVersion {
                major: self.mef_version_major,
                minor: self.mef_version_minor,
            });
        }
        Ok(())
    }

    /// Fail unless this header belongs to a file of type `expected`.
    pub fn expect_file_type(&self, expected: FileType) -> Result<(), HeaderError> {
        match self.file_type() {
            Some(found) if found == expected => Ok(()),
            _ => Err(HeaderError::UnexpectedFileType {
                expected,
                found: self.file_type_string,
            }),
        }
    }

    pub fn has_password_validation(&self) -> bool {
        self.level_1_password_validation_field.iter().any(|&b| b != 0)
    }

    /// Same header with `header_crc` set to the CRC of its own encoding.
    pub fn with_computed_crc(mut self) -> Self {
        let bytes = crate::headers::encode_universal_header(&self);
        self.header_crc = crate::utils::compute_crc(&bytes[UH_CRC_START_OFFSET..]);
        self
    }
}

// ---------------------------------------------------------------------------
// Generic header dispatch
// ---------------------------------------------------------------------------

/// Fixed-layout structures the codec understands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Universal,
    MetadataSection1,
    TimeSeriesSection2,
    VideoSection2,
    MetadataSection3,
    RecordHeader,
    TimeSeriesIndex,
    VideoIndex,
    RecordIndex,
}

impl HeaderKind {
    /// Encoded size in bytes.
    pub const fn len(self) -> usize {
        match self {
            HeaderKind::Universal => UNIVERSAL_HEADER_BYTES,
            HeaderKind::MetadataSection1 => METADATA_SECTION_1_BYTES,
            HeaderKind::TimeSeriesSection2 | HeaderKind::VideoSection2 => METADATA_SECTION_2_BYTES,
            HeaderKind::MetadataSection3 => METADATA_SECTION_3_BYTES,
            HeaderKind::RecordHeader => RECORD_HEADER_BYTES,
            HeaderKind::TimeSeriesIndex => TIME_SERIES_INDEX_BYTES,
            HeaderKind::VideoIndex => VIDEO_INDEX_BYTES,
            HeaderKind::RecordIndex => RECORD_INDEX_BYTES,
        }
    }
}

/// Decoded value of any `HeaderKind`.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    Universal(UniversalHeader),
    MetadataSection1(MetadataSection1),
    TimeSeriesSection2(Box<TimeSeriesSection2>),
    VideoSection2(Box<VideoSection2>),
    MetadataSection3(Box<MetadataSection3>),
    RecordHeader(RecordHeader),
    TimeSeriesIndex(TimeSeriesIndex),
    VideoIndex(VideoIndex),
    RecordIndex(RecordIndex),
}

impl Header {
    pub fn kind(&self) -> HeaderKind {
        match self {
            Header::Universal(_) => HeaderKind::Universal,
            Header::MetadataSection1(_) => HeaderKind::MetadataSection1,
            Header::TimeSeriesSection2(_) => HeaderKind::TimeSeriesSection2,
            Header::VideoSection2(_) => HeaderKind::VideoSection2,
            Header::MetadataSection3(_) => HeaderKind::MetadataSection3,
            Header::RecordHeader(_) => HeaderKind::RecordHeader,
            Header::TimeSeriesIndex(_) => HeaderKind::TimeSeriesIndex,
            Header::VideoIndex(_) => HeaderKind::VideoIndex,
            Header::RecordIndex(_) => HeaderKind::RecordIndex,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderError {
    /// Buffer shorter than the fixed size of the structure.
    BufferTooShort { have: usize, need: usize },

    /// Stored CRC differs from the CRC computed over the covered bytes.
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Byte order code other than 0 (big) or 1 (little).
    InvalidByteOrder { raw: u8 },

    /// Type string not in the MEF3 registry.
    UnknownFileType { raw: [u8; TYPE_BYTES] },

    /// Known type string, but not the one the caller opened.
    UnexpectedFileType { expected: FileType, found: [u8; TYPE_BYTES] },

    /// Major version other than 3.
    UnsupportedVersion { major: u8, minor: u8 },

    /// Text does not fit its fixed byte budget (one NUL must remain).
    FieldTooLong { have: usize, max: usize },

    /// Generic validation error with context.
    Validation(String),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HeaderError::*;
        match self {
            BufferTooShort { have, need } =>
                write!(f, "header buffer too short: {} < {}", have, need),
            ChecksumMismatch { expected, actual } =>
                write!(f, "CRC mismatch: stored 0x{:08x}, computed 0x{:08x}", expected, actual),
            InvalidByteOrder { raw } =>
                write!(f, "invalid byte order code: {}",
                    enum_name_or_hex::<ByteOrderCode>(*raw)),
            UnknownFileType { raw } =>
                write!(f, "unknown file type string: {}", fmt_bytes(raw)),
            UnexpectedFileType { expected, found } =>
                write!(f, "expected {:?} file, found type string {}", expected, fmt_bytes(found)),
            UnsupportedVersion { major, minor } =>
                write!(f, "unsupported MEF version: {}.{}", major, minor),
            FieldTooLong { have, max } =>
                write!(f, "text field too long: {} > {} bytes", have, max),
            Validation(msg) =>
                write!(f, "header validation error: {}", msg),
        }
    }
}

impl std::error::Error for HeaderError {}
