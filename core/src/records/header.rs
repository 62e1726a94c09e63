//! records/header.rs
//! Record header and record index codecs.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::headers::wire::{FieldReader, FieldWriter};
use crate::headers::{ByteOrderCode, HeaderError};
use crate::records::types::{RecordHeader, RecordIndex};

pub fn read_record_header<B: ByteOrder>(buf: &[u8]) -> RecordHeader {
    let mut r = FieldReader::<B>::new(buf);
    RecordHeader {
        record_crc: r.u32(),
        type_string: r.array(),
        version_major: r.u8(),
        version_minor: r.u8(),
        encryption: r.i8(),
        bytes: r.u32(),
        time: r.i64(),
    }
}

pub fn write_record_header<B: ByteOrder>(out: &mut [u8], h: &RecordHeader) {
    let mut w = FieldWriter::<B>::new(out);
    w.put_u32(h.record_crc);
    w.put_bytes(&h.type_string);
    w.put_u8(h.version_major);
    w.put_u8(h.version_minor);
    w.put_i8(h.encryption);
    w.put_u32(h.bytes);
    w.put_i64(h.time);
    debug_assert_eq!(w.position(), RecordHeader::LEN);
}

pub fn read_record_index<B: ByteOrder>(buf: &[u8]) -> RecordIndex {
    let mut r = FieldReader::<B>::new(buf);
    RecordIndex {
        type_string: r.array(),
        version_major: r.u8(),
        version_minor: r.u8(),
        encryption: r.i8(),
        file_offset: r.i64(),
        time: r.i64(),
    }
}

pub fn write_record_index<B: ByteOrder>(out: &mut [u8], e: &RecordIndex) {
    let mut w = FieldWriter::<B>::new(out);
    w.put_bytes(&e.type_string);
    w.put_u8(e.version_major);
    w.put_u8(e.version_minor);
    w.put_i8(e.encryption);
    w.put_i64(e.file_offset);
    w.put_i64(e.time);
    debug_assert_eq!(w.position(), RecordIndex::LEN);
}

/// Decode a `.ridx` body (everything after the universal header).
pub fn decode_record_indices(body: &[u8], order: ByteOrderCode) -> Result<Vec<RecordIndex>, HeaderError> {
    if body.len() % RecordIndex::LEN != 0 {
        return Err(HeaderError::Validation(format!(
            "record index body of {} bytes is not a multiple of {}", body.len(), RecordIndex::LEN
        )));
    }
    let read: fn(&[u8]) -> RecordIndex = match order {
        ByteOrderCode::LittleEndian => read_record_index::<LittleEndian>,
        ByteOrderCode::BigEndian => read_record_index::<BigEndian>,
    };
    Ok(body.chunks_exact(RecordIndex::LEN).map(read).collect())
}

/// Encode `.ridx` body bytes.
pub fn encode_record_indices(entries: &[RecordIndex], order: ByteOrderCode) -> Vec<u8> {
    let write: fn(&mut [u8], &RecordIndex) = match order {
        ByteOrderCode::LittleEndian => write_record_index::<LittleEndian>,
        ByteOrderCode::BigEndian => write_record_index::<BigEndian>,
    };
    let mut out = vec![0u8; entries.len() * RecordIndex::LEN];
    for (slot, e) in out.chunks_exact_mut(RecordIndex::LEN).zip(entries) {
        write(slot, e);
    }
    out
}

/// Decode a record header in the given byte order.
pub fn decode_record_header(buf: &[u8], order: ByteOrderCode) -> RecordHeader {
    match order {
        ByteOrderCode::LittleEndian => read_record_header::<LittleEndian>(buf),
        ByteOrderCode::BigEndian => read_record_header::<BigEndian>(buf),
    }
}
