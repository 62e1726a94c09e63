//! index/types.rs
//! Time-series block index (`.tidx`) and video clip index (`.vidx`) entries.

use bitflags::bitflags;
use serde::{Serialize, Serializer};

use crate::constants::*;
use crate::headers::Region;

bitflags! {
    /// Per-block flags of a RED-compressed sample block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RedBlockFlags: u8 {
        /// Block starts after a gap in the recording.
        const DISCONTINUITY = 0x01;
        /// Block payload is level 1 encrypted.
        const LEVEL_1_ENCRYPTION = 0x02;
        /// Block payload is level 2 encrypted.
        const LEVEL_2_ENCRYPTION = 0x04;
    }
}

impl Serialize for RedBlockFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

/// One entry per compressed sample block (56 bytes).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeSeriesIndex {
    pub file_offset: i64,                                               // 0
    pub start_time: i64,                                                // 8
    pub start_sample: i64,                                              // 16
    pub number_of_samples: u32,                                         // 24
    pub block_bytes: u32,                                               // 28
    pub maximum_sample_value: i32,                                      // 32
    pub minimum_sample_value: i32,                                      // 36
    pub protected_region: Region<TSI_PROTECTED_REGION_BYTES>,           // 40..44
    /// Unknown bits are kept so the entry re-encodes unchanged.
    pub red_block_flags: RedBlockFlags,                                 // 44
    pub red_block_protected_region: Region<TSI_RED_BLOCK_PROTECTED_REGION_BYTES>, // 45..48
    pub red_block_discretionary_region: Region<TSI_RED_BLOCK_DISCRETIONARY_REGION_BYTES>, // 48..56
}

impl TimeSeriesIndex {
    pub const LEN: usize = TIME_SERIES_INDEX_BYTES;

    pub fn is_discontinuity(&self) -> bool {
        self.red_block_flags.contains(RedBlockFlags::DISCONTINUITY)
    }

    /// One past the last sample number of the block; saturates at `i64::MAX`.
    pub fn end_sample(&self) -> i64 {
        self.start_sample.saturating_add(i64::from(self.number_of_samples))
    }
}

/// One entry per video clip (64 bytes).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VideoIndex {
    pub start_time: i64,                                        // 0
    pub end_time: i64,                                          // 8
    pub start_frame: u32,                                       // 16
    pub end_frame: u32,                                         // 20
    pub file_offset: i64,                                       // 24
    pub clip_bytes: i64,                                        // 32
    pub protected_region: Region<VI_PROTECTED_REGION_BYTES>,    // 40..56
    pub discretionary_region: Region<VI_DISCRETIONARY_REGION_BYTES>, // 56..64
}

impl VideoIndex {
    pub const LEN: usize = VIDEO_INDEX_BYTES;
}

/// Index entries of one segment, by channel type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "channel_type", content = "entries", rename_all = "snake_case")]
pub enum SegmentIndex {
    TimeSeries(Vec<TimeSeriesIndex>),
    Video(Vec<VideoIndex>),
}

impl SegmentIndex {
    pub fn len(&self) -> usize {
        match self {
            SegmentIndex::TimeSeries(v) => v.len(),
            SegmentIndex::Video(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn time_series(&self) -> &[TimeSeriesIndex] {
        match self {
            SegmentIndex::TimeSeries(v) => v,
            SegmentIndex::Video(_) => &[],
        }
    }

    pub fn video(&self) -> &[VideoIndex] {
        match self {
            SegmentIndex::Video(v) => v,
            SegmentIndex::TimeSeries(_) => &[],
        }
    }
}
