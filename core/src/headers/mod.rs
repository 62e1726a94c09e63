//! headers/mod.rs
//! Universal header codec and the generic fixed-layout dispatch.
//!
//! Notes:
//! - Every MEF3 file begins with a 1024-byte universal header that declares
//!   the file type, the format version and the byte order of everything
//!   after it.
//! - `decode_header` / `encode_header` dispatch on `HeaderKind` to the
//!   codecs in `metadata`, `index` and `records`.
//! - Reserved regions are carried verbatim so encode(decode(x)) == x.

pub mod types;
pub mod wire;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::*;
pub use decode::*;
