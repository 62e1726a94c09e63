//! assembler/model.rs
//! The value tree returned by a read: Session → Channel → Segment.
//!
//! Parents own their children by value. Names of enclosing levels are
//! repeated as plain strings; nothing points back up the tree.

use std::path::PathBuf;

use serde::Serialize;

use crate::assembler::layout::ChannelType;
use crate::constants::{SAMPLE_NUMBER_NO_ENTRY, UUID_BYTES, UUTC_NO_ENTRY};
use crate::headers::UniversalHeader;
use crate::index::SegmentIndex;
use crate::metadata::Metadata;
use crate::records::Record;
use crate::telemetry::ReadTelemetry;
use crate::types::Diagnostic;
use crate::utils::{earliest_uutc, latest_uutc};

/// Time span and record maxima of one level, folded up the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Aggregates {
    pub earliest_start_time: i64,
    pub latest_end_time: i64,
    pub maximum_number_of_records: i64,
    pub maximum_record_bytes: i64,
}

impl Default for Aggregates {
    fn default() -> Self {
        Self {
            earliest_start_time: UUTC_NO_ENTRY,
            latest_end_time: UUTC_NO_ENTRY,
            maximum_number_of_records: 0,
            maximum_record_bytes: 0,
        }
    }
}

impl Aggregates {
    /// min / max / max / max.
    pub fn include(&mut self, other: &Aggregates) {
        self.earliest_start_time = earliest_uutc(self.earliest_start_time, other.earliest_start_time);
        self.latest_end_time = latest_uutc(self.latest_end_time, other.latest_end_time);
        self.include_records(other.maximum_number_of_records, other.maximum_record_bytes);
    }

    pub fn include_records(&mut self, number_of_records: i64, maximum_record_bytes: i64) {
        self.maximum_number_of_records = self.maximum_number_of_records.max(number_of_records);
        self.maximum_record_bytes = self.maximum_record_bytes.max(maximum_record_bytes);
    }

    pub fn fold<'a>(children: impl IntoIterator<Item = &'a Aggregates>) -> Self {
        children.into_iter().fold(Self::default(), |mut acc, c| {
            acc.include(c);
            acc
        })
    }
}

/// One raw RED block, as stored in the `.tdat` file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleBlock {
    /// Position of the block's entry in the segment index.
    pub index: usize,
    pub file_offset: i64,
    pub start_time: i64,
    pub start_sample: i64,
    pub number_of_samples: u32,
    /// Stored block CRC (first 4 bytes of the block).
    pub block_crc: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub channel_type: ChannelType,
    pub name: String,
    pub path: PathBuf,
    pub channel_name: String,
    pub session_name: String,
    #[serde(with = "hex_uuid")]
    pub level_uuid: [u8; UUID_BYTES],
    pub segment_number: i32,
    pub metadata: Metadata,
    /// `None` when indices were not requested.
    pub index: Option<SegmentIndex>,
    pub records: Vec<Record>,
    /// Universal header of the `.tdat` file (time series only).
    pub data_universal_header: Option<UniversalHeader>,
    /// Raw blocks, when time-series data was requested.
    pub sample_blocks: Option<Vec<SampleBlock>>,
    pub aggregates: Aggregates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub channel_type: ChannelType,
    pub name: String,
    pub path: PathBuf,
    /// Directory extension (`timd` / `vidd`).
    pub extension: String,
    pub session_name: String,
    #[serde(with = "hex_uuid")]
    pub level_uuid: [u8; UUID_BYTES],
    pub anonymized_name: String,
    /// Segments merged in time order; `None` for a channel without segments.
    pub metadata: Option<Metadata>,
    /// Ordered by segment number.
    pub segments: Vec<Segment>,
    pub records: Vec<Record>,
    pub aggregates: Aggregates,
}

impl Channel {
    pub fn segment(&self, segment_number: i32) -> Option<&Segment> {
        self.segments.iter().find(|s| s.segment_number == segment_number)
    }

    /// (start time, channel-absolute start sample) of every indexed block.
    fn blocks(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.segments.iter().flat_map(|seg| {
            let base = match seg.metadata.time_series().map(|s| s.start_sample) {
                Some(s) if s != SAMPLE_NUMBER_NO_ENTRY => s,
                _ => 0,
            };
            let entries = seg.index.as_ref().map(|i| i.time_series()).unwrap_or(&[]);
            entries.iter().map(move |e| (e.start_time, base.saturating_add(e.start_sample)))
        })
    }

    fn sampling_frequency(&self) -> Option<f64> {
        self.metadata.as_ref()?.time_series().map(|s| s.sampling_frequency).filter(|fs| *fs > 0.0)
    }

    /// Sample number at `uutc`, extrapolated from the last block starting
    /// at or before it. `None` for video channels, unread indices, or times
    /// before the first block. `None` as well when the result does not fit
    /// in an `i64`.
    pub fn sample_for_time(&self, uutc: i64) -> Option<i64> {
        let fs = self.sampling_frequency()?;
        let (start_time, start_sample) = self.blocks().take_while(|(t, _)| *t <= uutc).last()?;
        let offset = uutc.checked_sub(start_time)? as f64 * fs / 1e6;
        start_sample.checked_add(offset.round() as i64)
    }

    /// µUTC time of `sample`, extrapolated from the last block starting at
    /// or before it.
    pub fn time_for_sample(&self, sample: i64) -> Option<i64> {
        let fs = self.sampling_frequency()?;
        let (start_time, start_sample) = self.blocks().take_while(|(_, s)| *s <= sample).last()?;
        let offset = sample.checked_sub(start_sample)? as f64 * 1e6 / fs;
        start_time.checked_add(offset.round() as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub name: String,
    pub path: PathBuf,
    pub anonymized_name: String,
    #[serde(with = "hex_uuid")]
    pub level_uuid: [u8; UUID_BYTES],
    pub time_series_channels: Vec<Channel>,
    pub video_channels: Vec<Channel>,
    /// Time-series channels merged side by side.
    pub time_series_metadata: Option<Metadata>,
    pub video_metadata: Option<Metadata>,
    pub records: Vec<Record>,
    pub aggregates: Aggregates,
    /// Non-fatal problems, sorted by location.
    pub diagnostics: Vec<Diagnostic>,
    pub telemetry: ReadTelemetry,
}

impl Session {
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.time_series_channels.iter().chain(&self.video_channels)
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels().find(|c| c.name == name)
    }
}

mod hex_uuid {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(uuid: &[u8; 16], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(uuid))
    }
}
