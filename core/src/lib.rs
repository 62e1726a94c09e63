//! mef3-core
//!
//! Pure Rust reader for MEF 3.0 (Multiscale Electrophysiology Format)
//! sessions. No FFI, no host bindings.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

// Format codecs
pub mod headers;
pub mod metadata;
pub mod index;
pub mod records;
pub mod crypto;
pub mod telemetry;

// Directory readers
pub mod assembler;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::assembler::{
        read_session, read_session_with, BehaviorOnFail, Channel, ChannelType, CrcPolicy, ReadOptions,
        Segment, Session,
    };
    pub use crate::metadata::Metadata;
    pub use crate::records::{Record, RecordBody};
    pub use crate::types::{Diagnostic, ErrorKind, MefError};
}
