//! headers/wire.rs
//!
//! Cursor helpers shared by every fixed-layout codec.
//!
//! Design notes:
//! - Generic over `byteorder::ByteOrder`; callers pick `LittleEndian` or
//!   `BigEndian` from the file's universal header, so one decoder body serves
//!   both orders.
//! - Callers check the total buffer length once up front (`ensure_len`);
//!   the per-field reads then slice without further checks.

use std::marker::PhantomData;

use byteorder::ByteOrder;

use crate::headers::types::{FixedString, HeaderError, Region};

/// Fail with `BufferTooShort` unless `buf` holds at least `need` bytes.
#[inline]
pub fn ensure_len(buf: &[u8], need: usize) -> Result<(), HeaderError> {
    if buf.len() < need {
        return Err(HeaderError::BufferTooShort { have: buf.len(), need });
    }
    Ok(())
}

/// Sequential reader over a fixed-layout buffer.
pub struct FieldReader<'a, B: ByteOrder> {
    buf: &'a [u8],
    pos: usize,
    _order: PhantomData<B>,
}

impl<'a, B: ByteOrder> FieldReader<'a, B> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, _order: PhantomData }
    }

    /// Current offset (bytes consumed).
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn take(&mut self, n: usize) -> &'a [u8] {
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        s
    }

    pub fn u8(&mut self) -> u8 { self.take(1)[0] }
    pub fn i8(&mut self) -> i8 { self.take(1)[0] as i8 }
    pub fn u32(&mut self) -> u32 { B::read_u32(self.take(4)) }
    pub fn i32(&mut self) -> i32 { B::read_i32(self.take(4)) }
    pub fn i64(&mut self) -> i64 { B::read_i64(self.take(8)) }
    pub fn f32(&mut self) -> f32 { B::read_f32(self.take(4)) }
    pub fn f64(&mut self) -> f64 { B::read_f64(self.take(8)) }

    pub fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut dst = [0u8; N];
        dst.copy_from_slice(self.take(N));
        dst
    }

    pub fn string<const N: usize>(&mut self) -> FixedString<N> {
        FixedString::from_bytes(self.array::<N>())
    }

    pub fn region<const N: usize>(&mut self) -> Region<N> {
        Region(self.array::<N>())
    }
}

/// Sequential writer into a caller-owned fixed-size buffer.
pub struct FieldWriter<'a, B: ByteOrder> {
    out: &'a mut [u8],
    pos: usize,
    _order: PhantomData<B>,
}

impl<'a, B: ByteOrder> FieldWriter<'a, B> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self { out, pos: 0, _order: PhantomData }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn slot(&mut self, n: usize) -> &mut [u8] {
        let start = self.pos;
        self.pos += n;
        &mut self.out[start..start + n]
    }

    pub fn put_u8(&mut self, v: u8) { self.slot(1)[0] = v; }
    pub fn put_i8(&mut self, v: i8) { self.slot(1)[0] = v as u8; }
    pub fn put_u32(&mut self, v: u32) { B::write_u32(self.slot(4), v); }
    pub fn put_i32(&mut self, v: i32) { B::write_i32(self.slot(4), v); }
    pub fn put_i64(&mut self, v: i64) { B::write_i64(self.slot(8), v); }
    pub fn put_f32(&mut self, v: f32) { B::write_f32(self.slot(4), v); }
    pub fn put_f64(&mut self, v: f64) { B::write_f64(self.slot(8), v); }

    pub fn put_bytes(&mut self, b: &[u8]) {
        self.slot(b.len()).copy_from_slice(b);
    }
}
