//! metadata/codec.rs
//! Section readers/writers and the metadata file decoder.
//!
//! Design notes:
//! - Readers take a buffer already checked to hold the section; they cannot
//!   fail. Writers take a zeroed buffer of the section size.
//! - Sections 2 and 3 are decrypted into fresh buffers before parsing; the
//!   file bytes are never modified. After decryption the section 1 flag is
//!   negated, marking the section as already decrypted.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

use crate::constants::*;
use crate::crypto::{decrypt_section, encrypt_region, AccessLevel, CryptoError, KeySet};
use crate::headers::wire::{ensure_len, FieldReader, FieldWriter};
use crate::headers::{encode_universal_header, finalize_file, ByteOrderCode, FileType, HeaderError, UniversalHeader};
use crate::metadata::types::*;
use crate::types::MefError;

// ---------------------------------------------------------------------------
// Section 1
// ---------------------------------------------------------------------------

pub fn read_section_1<B: ByteOrder>(buf: &[u8]) -> MetadataSection1 {
    let mut r = FieldReader::<B>::new(buf);
    MetadataSection1 {
        section_2_encryption: r.i8(),       // 0
        section_3_encryption: r.i8(),       // 1
        protected_region: r.region(),       // 2..768
        discretionary_region: r.region(),   // 768..1536
    }
}

pub fn write_section_1<B: ByteOrder>(out: &mut [u8], s: &MetadataSection1) {
    let mut w = FieldWriter::<B>::new(out);
    w.put_i8(s.section_2_encryption);
    w.put_i8(s.section_3_encryption);
    w.put_bytes(&s.protected_region.0);
    w.put_bytes(&s.discretionary_region.0);
    debug_assert_eq!(w.position(), METADATA_SECTION_1_BYTES);
}

// ---------------------------------------------------------------------------
// Section 2
// ---------------------------------------------------------------------------

pub fn read_time_series_section_2<B: ByteOrder>(buf: &[u8]) -> TimeSeriesSection2 {
    let mut r = FieldReader::<B>::new(buf);
    let s = TimeSeriesSection2 {
        channel_description: r.string(),
        session_description: r.string(),
        recording_duration: r.i64(),
        reference_description: r.string(),
        acquisition_channel_number: r.i64(),
        sampling_frequency: r.f64(),
        low_frequency_filter_setting: r.f64(),
        high_frequency_filter_setting: r.f64(),
        notch_filter_frequency_setting: r.f64(),
        ac_line_frequency: r.f64(),
        units_conversion_factor: r.f64(),
        units_description: r.string(),
        maximum_native_sample_value: r.f64(),
        minimum_native_sample_value: r.f64(),
        start_sample: r.i64(),
        number_of_samples: r.i64(),
        number_of_blocks: r.i64(),
        maximum_block_bytes: r.i64(),
        maximum_block_samples: r.u32(),
        maximum_difference_bytes: r.u32(),
        block_interval: r.i64(),
        number_of_discontinuities: r.i64(),
        maximum_contiguous_blocks: r.i64(),
        maximum_contiguous_block_bytes: r.i64(),
        maximum_contiguous_samples: r.i64(),
        protected_region: r.region(),
        discretionary_region: r.region(),
    };
    debug_assert_eq!(r.position(), METADATA_SECTION_2_BYTES);
    s
}

pub fn write_time_series_section_2<B: ByteOrder>(out: &mut [u8], s: &TimeSeriesSection2) {
    let mut w = FieldWriter::<B>::new(out);
    w.put_bytes(s.channel_description.as_bytes());
    w.put_bytes(s.session_description.as_bytes());
    w.put_i64(s.recording_duration);
    w.put_bytes(s.reference_description.as_bytes());
    w.put_i64(s.acquisition_channel_number);
    w.put_f64(s.sampling_frequency);
    w.put_f64(s.low_frequency_filter_setting);
    w.put_f64(s.high_frequency_filter_setting);
    w.put_f64(s.notch_filter_frequency_setting);
    w.put_f64(s.ac_line_frequency);
    w.put_f64(s.units_conversion_factor);
    w.put_bytes(s.units_description.as_bytes());
    w.put_f64(s.maximum_native_sample_value);
    w.put_f64(s.minimum_native_sample_value);
    w.put_i64(s.start_sample);
    w.put_i64(s.number_of_samples);
    w.put_i64(s.number_of_blocks);
    w.put_i64(s.maximum_block_bytes);
    w.put_u32(s.maximum_block_samples);
    w.put_u32(s.maximum_difference_bytes);
    w.put_i64(s.block_interval);
    w.put_i64(s.number_of_discontinuities);
    w.put_i64(s.maximum_contiguous_blocks);
    w.put_i64(s.maximum_contiguous_block_bytes);
    w.put_i64(s.maximum_contiguous_samples);
    w.put_bytes(&s.protected_region.0);
    w.put_bytes(&s.discretionary_region.0);
    debug_assert_eq!(w.position(), METADATA_SECTION_2_BYTES);
}

pub fn read_video_section_2<B: ByteOrder>(buf: &[u8]) -> VideoSection2 {
    let mut r = FieldReader::<B>::new(buf);
    let s = VideoSection2 {
        channel_description: r.string(),
        session_description: r.string(),
        recording_duration: r.i64(),
        horizontal_resolution: r.i64(),
        vertical_resolution: r.i64(),
        frame_rate: r.f64(),
        number_of_clips: r.i64(),
        maximum_clip_bytes: r.i64(),
        video_format: r.string(),
        video_file_crc: r.u32(),
        protected_region: r.region(),
        discretionary_region: r.region(),
    };
    debug_assert_eq!(r.position(), METADATA_SECTION_2_BYTES);
    s
}

pub fn write_video_section_2<B: ByteOrder>(out: &mut [u8], s: &VideoSection2) {
    let mut w = FieldWriter::<B>::new(out);
    w.put_bytes(s.channel_description.as_bytes());
    w.put_bytes(s.session_description.as_bytes());
    w.put_i64(s.recording_duration);
    w.put_i64(s.horizontal_resolution);
    w.put_i64(s.vertical_resolution);
    w.put_f64(s.frame_rate);
    w.put_i64(s.number_of_clips);
    w.put_i64(s.maximum_clip_bytes);
    w.put_bytes(s.video_format.as_bytes());
    w.put_u32(s.video_file_crc);
    w.put_bytes(&s.protected_region.0);
    w.put_bytes(&s.discretionary_region.0);
    debug_assert_eq!(w.position(), METADATA_SECTION_2_BYTES);
}

// ---------------------------------------------------------------------------
// Section 3
// ---------------------------------------------------------------------------

pub fn read_section_3<B: ByteOrder>(buf: &[u8]) -> MetadataSection3 {
    let mut r = FieldReader::<B>::new(buf);
    let s = MetadataSection3 {
        recording_time_offset: r.i64(),
        dst_start_time: r.i64(),
        dst_end_time: r.i64(),
        gmt_offset: r.i32(),
        subject_name_1: r.string(),
        subject_name_2: r.string(),
        subject_id: r.string(),
        recording_location: r.string(),
        protected_region: r.region(),
        discretionary_region: r.region(),
    };
    debug_assert_eq!(r.position(), METADATA_SECTION_3_BYTES);
    s
}

pub fn write_section_3<B: ByteOrder>(out: &mut [u8], s: &MetadataSection3) {
    let mut w = FieldWriter::<B>::new(out);
    w.put_i64(s.recording_time_offset);
    w.put_i64(s.dst_start_time);
    w.put_i64(s.dst_end_time);
    w.put_i32(s.gmt_offset);
    w.put_bytes(s.subject_name_1.as_bytes());
    w.put_bytes(s.subject_name_2.as_bytes());
    w.put_bytes(s.subject_id.as_bytes());
    w.put_bytes(s.recording_location.as_bytes());
    w.put_bytes(&s.protected_region.0);
    w.put_bytes(&s.discretionary_region.0);
    debug_assert_eq!(w.position(), METADATA_SECTION_3_BYTES);
}

// ---------------------------------------------------------------------------
// Whole file
// ---------------------------------------------------------------------------

fn parse_sections<B: ByteOrder>(
    file_type: FileType,
    s1: &[u8],
    s2: &[u8],
    s3: &[u8],
) -> (MetadataSection1, Section2, MetadataSection3) {
    let section_1 = read_section_1::<B>(s1);
    let section_2 = match file_type {
        FileType::VideoMetadata => Section2::Video(Box::new(read_video_section_2::<B>(s2))),
        _ => Section2::TimeSeries(Box::new(read_time_series_section_2::<B>(s2))),
    };
    (section_1, section_2, read_section_3::<B>(s3))
}

/// Decode a complete `.tmet` / `.vmet` file whose universal header has
/// already been decoded (and CRC-checked) by the caller.
///
/// # Errors
/// - `Header` when the file is short or not a metadata file.
/// - `Password` when a section is encrypted above the available access level.
pub fn decode_metadata(
    universal_header: UniversalHeader,
    file: &[u8],
    keys: &KeySet,
) -> Result<Metadata, MefError> {
    ensure_len(file, METADATA_FILE_BYTES)?;
    let file_type = match universal_header.file_type() {
        Some(t @ (FileType::TimeSeriesMetadata | FileType::VideoMetadata)) => t,
        _ => {
            return Err(HeaderError::UnexpectedFileType {
                expected: FileType::TimeSeriesMetadata,
                found: universal_header.file_type_string,
            }
            .into())
        }
    };
    let order = universal_header.byte_order_code;

    let s1 = &file[METADATA_SECTION_1_OFFSET..METADATA_SECTION_2_OFFSET];
    let (s2_enc, s3_enc) = (s1[0] as i8, s1[1] as i8);

    let s2 = decrypt_section(&file[METADATA_SECTION_2_OFFSET..METADATA_SECTION_3_OFFSET], s2_enc, keys)?;
    let s3 = decrypt_section(&file[METADATA_SECTION_3_OFFSET..METADATA_FILE_BYTES], s3_enc, keys)?;
    debug!(s2_enc, s3_enc, "metadata sections ready");

    let (mut section_1, section_2, section_3) = match order {
        ByteOrderCode::LittleEndian => parse_sections::<LittleEndian>(file_type, s1, &s2, &s3),
        ByteOrderCode::BigEndian => parse_sections::<BigEndian>(file_type, s1, &s2, &s3),
    };
    if section_1.section_2_encryption > 0 {
        section_1.section_2_encryption = -section_1.section_2_encryption;
    }
    if section_1.section_3_encryption > 0 {
        section_1.section_3_encryption = -section_1.section_3_encryption;
    }

    Ok(Metadata { universal_header, section_1, section_2, section_3 })
}

fn write_sections<B: ByteOrder>(m: &Metadata, out: &mut [u8]) {
    let (s1, rest) = out.split_at_mut(METADATA_SECTION_1_BYTES);
    let (s2, s3) = rest.split_at_mut(METADATA_SECTION_2_BYTES);
    write_section_1::<B>(s1, &m.section_1);
    match &m.section_2 {
        Section2::TimeSeries(s) => write_time_series_section_2::<B>(s2, s),
        Section2::Video(s) => write_video_section_2::<B>(s2, s),
    }
    write_section_3::<B>(s3, &m.section_3);
}

/// Encode a complete metadata file with both CRCs filled in.
///
/// Sections whose section 1 flag is positive are encrypted with that
/// level's key from `keys`.
pub fn encode_metadata(m: &Metadata, keys: &KeySet) -> Result<Vec<u8>, CryptoError> {
    let order = m.universal_header.byte_order_code;
    let mut file = vec![0u8; METADATA_FILE_BYTES];
    file[..UNIVERSAL_HEADER_BYTES].copy_from_slice(&encode_universal_header(&m.universal_header));
    match order {
        ByteOrderCode::LittleEndian => write_sections::<LittleEndian>(m, &mut file[UNIVERSAL_HEADER_BYTES..]),
        ByteOrderCode::BigEndian => write_sections::<BigEndian>(m, &mut file[UNIVERSAL_HEADER_BYTES..]),
    }

    let sections = [
        (METADATA_SECTION_2_OFFSET..METADATA_SECTION_3_OFFSET, m.section_1.section_2_encryption),
        (METADATA_SECTION_3_OFFSET..METADATA_FILE_BYTES, m.section_1.section_3_encryption),
    ];
    for (range, encryption) in sections {
        let level = AccessLevel::required_for(encryption)?;
        if level != AccessLevel::None {
            let sealed = encrypt_region(&file[range.clone()], keys.key_for(level)?)?;
            file[range].copy_from_slice(&sealed);
        }
    }

    finalize_file(&mut file, order);
    Ok(file)
}
