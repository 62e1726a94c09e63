//! index/codec.rs
//! Fixed-layout index entry codecs and index file bodies.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::headers::wire::{FieldReader, FieldWriter};
use crate::headers::{ByteOrderCode, HeaderError};
use crate::index::types::*;

pub fn read_time_series_index<B: ByteOrder>(buf: &[u8]) -> TimeSeriesIndex {
    let mut r = FieldReader::<B>::new(buf);
    TimeSeriesIndex {
        file_offset: r.i64(),
        start_time: r.i64(),
        start_sample: r.i64(),
        number_of_samples: r.u32(),
        block_bytes: r.u32(),
        maximum_sample_value: r.i32(),
        minimum_sample_value: r.i32(),
        protected_region: r.region(),
        red_block_flags: RedBlockFlags::from_bits_retain(r.u8()),
        red_block_protected_region: r.region(),
        red_block_discretionary_region: r.region(),
    }
}

pub fn write_time_series_index<B: ByteOrder>(out: &mut [u8], e: &TimeSeriesIndex) {
    let mut w = FieldWriter::<B>::new(out);
    w.put_i64(e.file_offset);
    w.put_i64(e.start_time);
    w.put_i64(e.start_sample);
    w.put_u32(e.number_of_samples);
    w.put_u32(e.block_bytes);
    w.put_i32(e.maximum_sample_value);
    w.put_i32(e.minimum_sample_value);
    w.put_bytes(&e.protected_region.0);
    w.put_u8(e.red_block_flags.bits());
    w.put_bytes(&e.red_block_protected_region.0);
    w.put_bytes(&e.red_block_discretionary_region.0);
    debug_assert_eq!(w.position(), TimeSeriesIndex::LEN);
}

pub fn read_video_index<B: ByteOrder>(buf: &[u8]) -> VideoIndex {
    let mut r = FieldReader::<B>::new(buf);
    VideoIndex {
        start_time: r.i64(),
        end_time: r.i64(),
        start_frame: r.u32(),
        end_frame: r.u32(),
        file_offset: r.i64(),
        clip_bytes: r.i64(),
        protected_region: r.region(),
        discretionary_region: r.region(),
    }
}

pub fn write_video_index<B: ByteOrder>(out: &mut [u8], e: &VideoIndex) {
    let mut w = FieldWriter::<B>::new(out);
    w.put_i64(e.start_time);
    w.put_i64(e.end_time);
    w.put_u32(e.start_frame);
    w.put_u32(e.end_frame);
    w.put_i64(e.file_offset);
    w.put_i64(e.clip_bytes);
    w.put_bytes(&e.protected_region.0);
    w.put_bytes(&e.discretionary_region.0);
    debug_assert_eq!(w.position(), VideoIndex::LEN);
}

fn decode_entries<T>(
    body: &[u8],
    expected: i64,
    entry_len: usize,
    read: impl Fn(&[u8]) -> T,
) -> Result<Vec<T>, HeaderError> {
    if body.len() % entry_len != 0 {
        return Err(HeaderError::Validation(format!(
            "index body of {} bytes is not a multiple of {}", body.len(), entry_len
        )));
    }
    let count = body.len() / entry_len;
    if expected >= 0 && count as i64 != expected {
        return Err(HeaderError::Validation(format!(
            "index holds {} entries, universal header declares {}", count, expected
        )));
    }
    Ok(body.chunks_exact(entry_len).map(read).collect())
}

/// Decode a `.tidx` body (everything after the universal header).
///
/// `expected` is the universal header's `number_of_entries`; a negative
/// value skips the count check.
pub fn decode_time_series_indices(
    body: &[u8],
    expected: i64,
    order: ByteOrderCode,
) -> Result<Vec<TimeSeriesIndex>, HeaderError> {
    match order {
        ByteOrderCode::LittleEndian =>
            decode_entries(body, expected, TimeSeriesIndex::LEN, read_time_series_index::<LittleEndian>),
        ByteOrderCode::BigEndian =>
            decode_entries(body, expected, TimeSeriesIndex::LEN, read_time_series_index::<BigEndian>),
    }
}

/// Decode a `.vidx` body.
pub fn decode_video_indices(
    body: &[u8],
    expected: i64,
    order: ByteOrderCode,
) -> Result<Vec<VideoIndex>, HeaderError> {
    match order {
        ByteOrderCode::LittleEndian =>
            decode_entries(body, expected, VideoIndex::LEN, read_video_index::<LittleEndian>),
        ByteOrderCode::BigEndian =>
            decode_entries(body, expected, VideoIndex::LEN, read_video_index::<BigEndian>),
    }
}

fn encode_entries<T>(entries: &[T], entry_len: usize, write: impl Fn(&mut [u8], &T)) -> Vec<u8> {
    let mut out = vec![0u8; entries.len() * entry_len];
    for (slot, e) in out.chunks_exact_mut(entry_len).zip(entries) {
        write(slot, e);
    }
    out
}

/// Encode `.tidx` body bytes.
pub fn encode_time_series_indices(entries: &[TimeSeriesIndex], order: ByteOrderCode) -> Vec<u8> {
    match order {
        ByteOrderCode::LittleEndian =>
            encode_entries(entries, TimeSeriesIndex::LEN, write_time_series_index::<LittleEndian>),
        ByteOrderCode::BigEndian =>
            encode_entries(entries, TimeSeriesIndex::LEN, write_time_series_index::<BigEndian>),
    }
}

/// Encode `.vidx` body bytes.
pub fn encode_video_indices(entries: &[VideoIndex], order: ByteOrderCode) -> Vec<u8> {
    match order {
        ByteOrderCode::LittleEndian =>
            encode_entries(entries, VideoIndex::LEN, write_video_index::<LittleEndian>),
        ByteOrderCode::BigEndian =>
            encode_entries(entries, VideoIndex::LEN, write_video_index::<BigEndian>),
    }
}

/// Position of the first entry whose start time precedes its predecessor's.
pub fn first_out_of_order<T>(entries: &[T], start_time: impl Fn(&T) -> i64) -> Option<usize> {
    entries
        .windows(2)
        .position(|w| start_time(&w[1]) < start_time(&w[0]))
        .map(|i| i + 1)
}
