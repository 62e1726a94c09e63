//! telemetry/mod.rs
//! Read telemetry: counters, stage timers and the immutable snapshot
//! attached to every returned `Session`.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
