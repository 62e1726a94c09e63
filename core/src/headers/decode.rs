//! src/headers/decode.rs
//!
//! Header decoding utilities.
//!
//! Design notes:
//! - The byte order code sits at offset 15, a single byte, so it can be read
//!   before the order of any multi-byte field is known.
//! - Field order must match `encode.rs` exactly.
//! - The header CRC is verified after decoding; `*_unchecked` skips it for
//!   callers that run with CRC checking disabled.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::constants::*;
use crate::headers::types::{ByteOrderCode, Header, HeaderError, HeaderKind, UniversalHeader};
use crate::headers::wire::{ensure_len, FieldReader};
use crate::{index, metadata, records};
use crate::utils::compute_crc;

/// Byte order declared by a raw universal header.
#[inline]
pub fn peek_byte_order(buf: &[u8]) -> Result<ByteOrderCode, HeaderError> {
    ensure_len(buf, UNIVERSAL_HEADER_BYTES)?;
    ByteOrderCode::verify(buf[15])
}

fn read_universal<B: ByteOrder>(buf: &[u8], order: ByteOrderCode) -> UniversalHeader {
    let mut r = FieldReader::<B>::new(buf);

    let header_crc = r.u32();                // 0..4
    let body_crc = r.u32();                  // 4..8
    let file_type_string = r.array::<TYPE_BYTES>(); // 8..13
    let mef_version_major = r.u8();          // 13
    let mef_version_minor = r.u8();          // 14
    let _ = r.u8();                          // 15 byte order (already decoded)

    let h = UniversalHeader {
        header_crc,
        body_crc,
        file_type_string,
        mef_version_major,
        mef_version_minor,
        byte_order_code: order,
        start_time: r.i64(),                 // 16..24
        end_time: r.i64(),                   // 24..32
        number_of_entries: r.i64(),          // 32..40
        maximum_entry_size: r.i64(),         // 40..48
        segment_number: r.i32(),             // 48..52
        channel_name: r.string(),            // 52..308
        session_name: r.string(),            // 308..564
        anonymized_name: r.string(),         // 564..820
        level_uuid: r.array(),               // 820..836
        file_uuid: r.array(),                // 836..852
        provenance_uuid: r.array(),          // 852..868
        level_1_password_validation_field: r.array(), // 868..884
        level_2_password_validation_field: r.array(), // 884..900
        protected_region: r.region(),        // 900..960
        discretionary_region: r.region(),    // 960..1024
    };
    debug_assert_eq!(r.position(), UNIVERSAL_HEADER_BYTES, "universal header decode length");
    h
}

/// Decode and validate a universal header without checking its CRC.
pub fn decode_universal_header_unchecked(buf: &[u8]) -> Result<UniversalHeader, HeaderError> {
    let order = peek_byte_order(buf)?;
    let h = match order {
        ByteOrderCode::LittleEndian => read_universal::<LittleEndian>(buf, order),
        ByteOrderCode::BigEndian => read_universal::<BigEndian>(buf, order),
    };
    h.validate()?;
    Ok(h)
}

/// Decode a universal header and verify its header CRC.
///
/// # Returns
/// - `Err(HeaderError::ChecksumMismatch)` carrying (stored, computed) when
///   the CRC over bytes 4..1024 does not match; the caller decides whether
///   to suppress it.
pub fn decode_universal_header(buf: &[u8]) -> Result<UniversalHeader, HeaderError> {
    let h = decode_universal_header_unchecked(buf)?;
    verify_header_crc(buf, h.header_crc)?;
    Ok(h)
}

/// Compare a stored header CRC against the CRC of bytes 4..1024.
pub fn verify_header_crc(buf: &[u8], stored: u32) -> Result<(), HeaderError> {
    ensure_len(buf, UNIVERSAL_HEADER_BYTES)?;
    let computed = compute_crc(&buf[UH_CRC_START_OFFSET..UNIVERSAL_HEADER_BYTES]);
    if computed != stored {
        return Err(HeaderError::ChecksumMismatch { expected: stored, actual: computed });
    }
    Ok(())
}

fn decode_with<B: ByteOrder>(buf: &[u8], kind: HeaderKind) -> Header {
    match kind {
        HeaderKind::Universal => unreachable!("universal header carries its own byte order"),
        HeaderKind::MetadataSection1 => Header::MetadataSection1(metadata::read_section_1::<B>(buf)),
        HeaderKind::TimeSeriesSection2 => Header::TimeSeriesSection2(Box::new(metadata::read_time_series_section_2::<B>(buf))),
        HeaderKind::VideoSection2 => Header::VideoSection2(Box::new(metadata::read_video_section_2::<B>(buf))),
        HeaderKind::MetadataSection3 => Header::MetadataSection3(Box::new(metadata::read_section_3::<B>(buf))),
        HeaderKind::RecordHeader => Header::RecordHeader(records::read_record_header::<B>(buf)),
        HeaderKind::TimeSeriesIndex => Header::TimeSeriesIndex(index::read_time_series_index::<B>(buf)),
        HeaderKind::VideoIndex => Header::VideoIndex(index::read_video_index::<B>(buf)),
        HeaderKind::RecordIndex => Header::RecordIndex(records::read_record_index::<B>(buf)),
    }
}

/// Decode any fixed-layout structure.
///
/// `order` is the byte order of the enclosing file; it is ignored for
/// `HeaderKind::Universal`, which declares its own.
pub fn decode_header(buf: &[u8], kind: HeaderKind, order: ByteOrderCode) -> Result<Header, HeaderError> {
    ensure_len(buf, kind.len())?;
    if kind == HeaderKind::Universal {
        return decode_universal_header(buf).map(Header::Universal);
    }
    Ok(match order {
        ByteOrderCode::LittleEndian => decode_with::<LittleEndian>(buf, kind),
        ByteOrderCode::BigEndian => decode_with::<BigEndian>(buf, kind),
    })
}
