//! constants.rs
//! Fixed sizes, offsets, file extensions and "no entry" sentinels of the
//! MEF 3.0 on-disk format.
//!
//! All sizes are in bytes. Layouts are authoritative here; codecs in
//! `headers`, `metadata`, `index` and `records` must agree with them.

/// Supported format version.
pub const MEF_VERSION_MAJOR: u8 = 3;
pub const MEF_VERSION_MINOR: u8 = 0;

/// Byte order codes stored at offset 15 of the universal header.
pub const BIG_ENDIAN_CODE: u8 = 0;
pub const LITTLE_ENDIAN_CODE: u8 = 1;

// ---------------------------------------------------------------------------
// Universal header
// ---------------------------------------------------------------------------
pub const UNIVERSAL_HEADER_BYTES: usize = 1024;
pub const UH_HEADER_CRC_OFFSET: usize = 0;
pub const UH_BODY_CRC_OFFSET: usize = 4;
/// First byte covered by the header CRC.
pub const UH_CRC_START_OFFSET: usize = 4;
pub const TYPE_BYTES: usize = 5;
pub const UH_NAME_BYTES: usize = 256;
pub const UUID_BYTES: usize = 16;
pub const PASSWORD_VALIDATION_FIELD_BYTES: usize = 16;
pub const UH_PROTECTED_REGION_BYTES: usize = 60;
pub const UH_DISCRETIONARY_REGION_BYTES: usize = 64;

/// `segment_number` values for files that live above segment level.
pub const UH_CHANNEL_LEVEL_CODE: i32 = -1;
pub const UH_SESSION_LEVEL_CODE: i32 = -2;
pub const SEGMENT_NUMBER_NO_ENTRY: i32 = -3;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------
pub const METADATA_SECTION_1_BYTES: usize = 1536;
pub const METADATA_SECTION_2_BYTES: usize = 10752;
pub const METADATA_SECTION_3_BYTES: usize = 3072;
pub const METADATA_FILE_BYTES: usize = UNIVERSAL_HEADER_BYTES
    + METADATA_SECTION_1_BYTES
    + METADATA_SECTION_2_BYTES
    + METADATA_SECTION_3_BYTES; // 16384

pub const METADATA_SECTION_1_OFFSET: usize = UNIVERSAL_HEADER_BYTES;
pub const METADATA_SECTION_2_OFFSET: usize = METADATA_SECTION_1_OFFSET + METADATA_SECTION_1_BYTES;
pub const METADATA_SECTION_3_OFFSET: usize = METADATA_SECTION_2_OFFSET + METADATA_SECTION_2_BYTES;

pub const MD1_PROTECTED_REGION_BYTES: usize = 766;
pub const MD1_DISCRETIONARY_REGION_BYTES: usize = 768;

pub const METADATA_DESCRIPTION_BYTES: usize = 2048;
pub const METADATA_UNITS_DESCRIPTION_BYTES: usize = 128;
pub const TMD2_PROTECTED_REGION_BYTES: usize = 2160;
pub const TMD2_DISCRETIONARY_REGION_BYTES: usize = 2160;

pub const METADATA_VIDEO_FORMAT_BYTES: usize = 128;
pub const VMD2_PROTECTED_REGION_BYTES: usize = 3236;
pub const VMD2_DISCRETIONARY_REGION_BYTES: usize = 3240;

pub const METADATA_SUBJECT_NAME_BYTES: usize = 128;
pub const METADATA_SUBJECT_ID_BYTES: usize = 128;
pub const METADATA_RECORDING_LOCATION_BYTES: usize = 512;
pub const MD3_PROTECTED_REGION_BYTES: usize = 1124;
pub const MD3_DISCRETIONARY_REGION_BYTES: usize = 1024;

// ---------------------------------------------------------------------------
// Indices
// ---------------------------------------------------------------------------
pub const TIME_SERIES_INDEX_BYTES: usize = 56;
pub const TSI_PROTECTED_REGION_BYTES: usize = 4;
pub const TSI_RED_BLOCK_PROTECTED_REGION_BYTES: usize = 3;
pub const TSI_RED_BLOCK_DISCRETIONARY_REGION_BYTES: usize = 8;

pub const VIDEO_INDEX_BYTES: usize = 64;
pub const VI_PROTECTED_REGION_BYTES: usize = 16;
pub const VI_DISCRETIONARY_REGION_BYTES: usize = 8;

/// First byte of a RED block covered by its block CRC.
pub const RED_BLOCK_CRC_START_OFFSET: usize = 4;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------
pub const RECORD_HEADER_BYTES: usize = 24;
pub const RECORD_INDEX_BYTES: usize = 24;
/// First byte of a record covered by its record CRC.
pub const RECORD_CRC_START_OFFSET: usize = 4;

// ---------------------------------------------------------------------------
// Encryption
// ---------------------------------------------------------------------------
pub const PASSWORD_BYTES: usize = 16;
pub const ENCRYPTION_BLOCK_BYTES: usize = 16;
pub const NO_ENCRYPTION: i8 = 0;
pub const LEVEL_1_ENCRYPTION: i8 = 1;
pub const LEVEL_2_ENCRYPTION: i8 = 2;

// ---------------------------------------------------------------------------
// "No entry" sentinels
// ---------------------------------------------------------------------------
pub const UUTC_NO_ENTRY: i64 = i64::MIN;
pub const FREQUENCY_NO_ENTRY: f64 = -1.0;
pub const SAMPLE_NUMBER_NO_ENTRY: i64 = -1;
pub const GMT_OFFSET_NO_ENTRY: i32 = -86_401;

// ---------------------------------------------------------------------------
// File and directory extensions
// ---------------------------------------------------------------------------
pub mod extensions {
    pub const SESSION_DIRECTORY: &str = "mefd";
    pub const TIME_SERIES_CHANNEL_DIRECTORY: &str = "timd";
    pub const VIDEO_CHANNEL_DIRECTORY: &str = "vidd";
    pub const SEGMENT_DIRECTORY: &str = "segd";

    pub const RECORD_DATA_FILE: &str = "rdat";
    pub const RECORD_INDICES_FILE: &str = "ridx";
    pub const TIME_SERIES_METADATA_FILE: &str = "tmet";
    pub const TIME_SERIES_DATA_FILE: &str = "tdat";
    pub const TIME_SERIES_INDICES_FILE: &str = "tidx";
    pub const VIDEO_METADATA_FILE: &str = "vmet";
    pub const VIDEO_INDICES_FILE: &str = "vidx";
}

/// Four-character record type codes.
pub mod record_types {
    pub const NOTE: [u8; 4] = *b"Note";
    pub const EDFA: [u8; 4] = *b"EDFA";
    pub const LNTP: [u8; 4] = *b"LNTP";
    pub const SEIZ: [u8; 4] = *b"Seiz";
    pub const CSTI: [u8; 4] = *b"CSti";
    pub const ESTI: [u8; 4] = *b"ESti";
    pub const SYLG: [u8; 4] = *b"SyLg";
    pub const CURS: [u8; 4] = *b"Curs";
    pub const EPOC: [u8; 4] = *b"Epoc";
}
