//! records/mod.rs
//! Record files (`.rdat` / `.ridx`): fixed headers, typed bodies, and the
//! stream walker used at session, channel and segment level.

pub mod types;
pub mod header;
pub mod decode;
pub mod encode;
pub mod stream;

pub use types::*;
pub use header::*;
pub use decode::*;
pub use encode::*;
pub use stream::*;
