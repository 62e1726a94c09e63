//! assembler/mod.rs
//! Directory-level readers: segment → channel → session, with the read
//! options, file access and layout helpers they share.

pub mod options;
pub mod io;
pub mod layout;
pub mod model;
pub mod level;
pub mod segment;
pub mod channel;
pub mod session;

pub use options::*;
pub use layout::ChannelType;
pub use model::*;
pub use segment::assemble_segment;
pub use channel::assemble_channel;
pub use session::{read_session, read_session_with};
