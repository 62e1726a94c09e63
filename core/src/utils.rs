use std::fmt;

use chrono::{DateTime, Utc};
use crc::{Algorithm, Crc};
use num_enum::TryFromPrimitive;

use crate::constants::UUTC_NO_ENTRY;

/// MEF 3.0 checksum: CRC-32 with the Koopman polynomial
/// (reflected form 0xEB31D82E), seeded with 0xFFFFFFFF, no final xor.
pub const CRC_32_MEF: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x741b_8cd7,
    init: 0xffff_ffff,
    refin: true,
    refout: true,
    xorout: 0x0000_0000,
    check: 0xd2c2_2f51,
    residue: 0x0000_0000,
};

pub static MEF_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_MEF);

/// One-shot CRC over a CRC-covered region.
#[inline]
pub fn compute_crc(data: &[u8]) -> u32 {
    MEF_CRC.checksum(data)
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

pub fn fmt_bytes(b: &[u8]) -> String {
    if b.iter().all(|&c| c.is_ascii_graphic() || c == b' ') {
        format!("b\"{}\"", String::from_utf8_lossy(b))
    } else {
        format!("0x{}", hex::encode(b))
    }
}

/// Render a µUTC timestamp for logs; sentinel and out-of-range values are
/// shown raw.
pub fn format_uutc(uutc: i64) -> String {
    if uutc == UUTC_NO_ENTRY {
        return "no entry".to_string();
    }
    match DateTime::<Utc>::from_timestamp_micros(uutc) {
        Some(dt) => dt.to_rfc3339(),
        None => format!("{} µUTC", uutc),
    }
}

/// Earlier of two µUTC timestamps, treating the "no entry" sentinel as absent.
pub fn earliest_uutc(a: i64, b: i64) -> i64 {
    match (a == UUTC_NO_ENTRY, b == UUTC_NO_ENTRY) {
        (true, _) => b,
        (_, true) => a,
        _ => a.min(b),
    }
}

/// Later of two µUTC timestamps, treating the "no entry" sentinel as absent.
pub fn latest_uutc(a: i64, b: i64) -> i64 {
    match (a == UUTC_NO_ENTRY, b == UUTC_NO_ENTRY) {
        (true, _) => b,
        (_, true) => a,
        _ => a.max(b),
    }
}
