//! src/headers/encode.rs
//!
//! Header encoding utilities.
//!
//! Design notes:
//! - Exact inverse of `decode.rs`: same field order, same byte order.
//! - The universal header CRC is recomputed on every encode; the stored
//!   `header_crc` field is ignored.
//! - `body_crc` is written as given. It covers bytes the header encoder
//!   never sees, so `finalize_file` fills it in for complete file images.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::constants::*;
use crate::headers::types::{ByteOrderCode, Header, UniversalHeader};
use crate::headers::wire::FieldWriter;
use crate::{index, metadata, records};
use crate::utils::compute_crc;

fn write_universal<B: ByteOrder>(out: &mut [u8], h: &UniversalHeader) {
    let mut w = FieldWriter::<B>::new(out);

    w.put_u32(0);                                   // 0..4   header CRC (patched below)
    w.put_u32(h.body_crc);                          // 4..8
    w.put_bytes(&h.file_type_string);               // 8..13
    w.put_u8(h.mef_version_major);                  // 13
    w.put_u8(h.mef_version_minor);                  // 14
    w.put_u8(h.byte_order_code as u8);              // 15
    w.put_i64(h.start_time);                        // 16..24
    w.put_i64(h.end_time);                          // 24..32
    w.put_i64(h.number_of_entries);                 // 32..40
    w.put_i64(h.maximum_entry_size);                // 40..48
    w.put_i32(h.segment_number);                    // 48..52
    w.put_bytes(h.channel_name.as_bytes());         // 52..308
    w.put_bytes(h.session_name.as_bytes());         // 308..564
    w.put_bytes(h.anonymized_name.as_bytes());      // 564..820
    w.put_bytes(&h.level_uuid);                     // 820..836
    w.put_bytes(&h.file_uuid);                      // 836..852
    w.put_bytes(&h.provenance_uuid);                // 852..868
    w.put_bytes(&h.level_1_password_validation_field); // 868..884
    w.put_bytes(&h.level_2_password_validation_field); // 884..900
    w.put_bytes(&h.protected_region.0);             // 900..960
    w.put_bytes(&h.discretionary_region.0);         // 960..1024

    debug_assert_eq!(w.position(), UNIVERSAL_HEADER_BYTES, "encoding wrote incorrect length");

    let crc = compute_crc(&out[UH_CRC_START_OFFSET..UNIVERSAL_HEADER_BYTES]);
    B::write_u32(&mut out[UH_HEADER_CRC_OFFSET..UH_HEADER_CRC_OFFSET + 4], crc);
}

/// Serialize a universal header (1024 bytes) in its declared byte order,
/// with a freshly computed header CRC.
pub fn encode_universal_header(h: &UniversalHeader) -> [u8; UNIVERSAL_HEADER_BYTES] {
    let mut out = [0u8; UNIVERSAL_HEADER_BYTES];
    match h.byte_order_code {
        ByteOrderCode::LittleEndian => write_universal::<LittleEndian>(&mut out, h),
        ByteOrderCode::BigEndian => write_universal::<BigEndian>(&mut out, h),
    }
    out
}

fn encode_with<B: ByteOrder>(header: &Header) -> Vec<u8> {
    let mut out = vec![0u8; header.kind().len()];
    match header {
        Header::Universal(h) => out.copy_from_slice(&encode_universal_header(h)),
        Header::MetadataSection1(s) => metadata::write_section_1::<B>(&mut out, s),
        Header::TimeSeriesSection2(s) => metadata::write_time_series_section_2::<B>(&mut out, s),
        Header::VideoSection2(s) => metadata::write_video_section_2::<B>(&mut out, s),
        Header::MetadataSection3(s) => metadata::write_section_3::<B>(&mut out, s),
        Header::RecordHeader(h) => records::write_record_header::<B>(&mut out, h),
        Header::TimeSeriesIndex(i) => index::write_time_series_index::<B>(&mut out, i),
        Header::VideoIndex(i) => index::write_video_index::<B>(&mut out, i),
        Header::RecordIndex(i) => records::write_record_index::<B>(&mut out, i),
    }
    out
}

/// Encode any fixed-layout structure in the given byte order.
pub fn encode_header(header: &Header, order: ByteOrderCode) -> Vec<u8> {
    match order {
        ByteOrderCode::LittleEndian => encode_with::<LittleEndian>(header),
        ByteOrderCode::BigEndian => encode_with::<BigEndian>(header),
    }
}

/// Finalize a complete file image in place: write the body CRC over
/// `file[1024..]` into the header, then recompute the header CRC.
///
/// The header must already be encoded at the start of `file`.
pub fn finalize_file(file: &mut [u8], order: ByteOrderCode) {
    debug_assert!(file.len() >= UNIVERSAL_HEADER_BYTES, "file image shorter than header");
    let body_crc = compute_crc(&file[UNIVERSAL_HEADER_BYTES..]);
    let put: fn(&mut [u8], u32) = match order {
        ByteOrderCode::LittleEndian => LittleEndian::write_u32,
        ByteOrderCode::BigEndian => BigEndian::write_u32,
    };
    put(&mut file[UH_BODY_CRC_OFFSET..UH_BODY_CRC_OFFSET + 4], body_crc);
    let header_crc = compute_crc(&file[UH_CRC_START_OFFSET..UNIVERSAL_HEADER_BYTES]);
    put(&mut file[UH_HEADER_CRC_OFFSET..UH_HEADER_CRC_OFFSET + 4], header_crc);
}
