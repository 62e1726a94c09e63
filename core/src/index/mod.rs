//! index/mod.rs
//! Segment index files: one entry per RED block (`.tidx`) or video clip
//! (`.vidx`), ordered by file offset.

pub mod types;
pub mod codec;

pub use types::*;
pub use codec::*;
