//! metadata/mod.rs
//! Metadata files (`.tmet`, `.vmet`): section codecs, decryption-aware file
//! decoder and the channel/session aggregation rules.

pub mod types;
pub mod codec;
pub mod aggregate;

pub use types::*;
pub use codec::*;
pub use aggregate::*;
