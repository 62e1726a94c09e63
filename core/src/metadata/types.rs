//! metadata/types.rs
//! Sections 1-3 of a `.tmet` / `.vmet` metadata file.
//!
//! Notes:
//! - Section 1 is never encrypted; it says how sections 2 and 3 are.
//! - Section 2 differs between time-series and video channels.
//! - Field comments give offsets relative to the start of the section.

use serde::Serialize;

use crate::constants::*;
use crate::headers::{FixedString, Region, UniversalHeader};

/// Section 1 (1536 bytes): encryption levels of sections 2 and 3.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MetadataSection1 {
    /// 0 none, 1 level 1, 2 level 2; negative when already decrypted.
    pub section_2_encryption: i8,                                   // 0
    pub section_3_encryption: i8,                                   // 1
    pub protected_region: Region<MD1_PROTECTED_REGION_BYTES>,       // 2..768
    pub discretionary_region: Region<MD1_DISCRETIONARY_REGION_BYTES>, // 768..1536
}

/// Section 2 of a time-series channel (10752 bytes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesSection2 {
    pub channel_description: FixedString<METADATA_DESCRIPTION_BYTES>,   // 0..2048
    pub session_description: FixedString<METADATA_DESCRIPTION_BYTES>,   // 2048..4096
    pub recording_duration: i64,                                        // 4096
    pub reference_description: FixedString<METADATA_DESCRIPTION_BYTES>, // 4104..6152
    pub acquisition_channel_number: i64,                                // 6152
    pub sampling_frequency: f64,                                        // 6160
    pub low_frequency_filter_setting: f64,                              // 6168
    pub high_frequency_filter_setting: f64,                             // 6176
    pub notch_filter_frequency_setting: f64,                            // 6184
    pub ac_line_frequency: f64,                                         // 6192
    pub units_conversion_factor: f64,                                   // 6200
    pub units_description: FixedString<METADATA_UNITS_DESCRIPTION_BYTES>, // 6208..6336
    pub maximum_native_sample_value: f64,                               // 6336
    pub minimum_native_sample_value: f64,                               // 6344
    pub start_sample: i64,                                              // 6352
    pub number_of_samples: i64,                                         // 6360
    pub number_of_blocks: i64,                                          // 6368
    pub maximum_block_bytes: i64,                                       // 6376
    pub maximum_block_samples: u32,                                     // 6384
    pub maximum_difference_bytes: u32,                                  // 6388
    pub block_interval: i64,                                            // 6392
    pub number_of_discontinuities: i64,                                 // 6400
    pub maximum_contiguous_blocks: i64,                                 // 6408
    pub maximum_contiguous_block_bytes: i64,                            // 6416
    pub maximum_contiguous_samples: i64,                                // 6424
    pub protected_region: Region<TMD2_PROTECTED_REGION_BYTES>,          // 6432..8592
    pub discretionary_region: Region<TMD2_DISCRETIONARY_REGION_BYTES>,  // 8592..10752
}

impl Default for TimeSeriesSection2 {
    fn default() -> Self {
        Self {
            channel_description: FixedString::default(),
            session_description: FixedString::default(),
            recording_duration: 0,
            reference_description: FixedString::default(),
            acquisition_channel_number: 0,
            sampling_frequency: FREQUENCY_NO_ENTRY,
            low_frequency_filter_setting: FREQUENCY_NO_ENTRY,
            high_frequency_filter_setting: FREQUENCY_NO_ENTRY,
            notch_filter_frequency_setting: FREQUENCY_NO_ENTRY,
            ac_line_frequency: FREQUENCY_NO_ENTRY,
            units_conversion_factor: 0.0,
            units_description: FixedString::default(),
            maximum_native_sample_value: 0.0,
            minimum_native_sample_value: 0.0,
            start_sample: SAMPLE_NUMBER_NO_ENTRY,
            number_of_samples: 0,
            number_of_blocks: 0,
            maximum_block_bytes: 0,
            maximum_block_samples: 0,
            maximum_difference_bytes: 0,
            block_interval: 0,
            number_of_discontinuities: 0,
            maximum_contiguous_blocks: 0,
            maximum_contiguous_block_bytes: 0,
            maximum_contiguous_samples: 0,
            protected_region: Region::default(),
            discretionary_region: Region::default(),
        }
    }
}

/// Section 2 of a video channel (10752 bytes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSection2 {
    pub channel_description: FixedString<METADATA_DESCRIPTION_BYTES>, // 0..2048
    pub session_description: FixedString<METADATA_DESCRIPTION_BYTES>, // 2048..4096
    pub recording_duration: i64,                                      // 4096
    pub horizontal_resolution: i64,                                   // 4104
    pub vertical_resolution: i64,                                     // 4112
    pub frame_rate: f64,                                              // 4120
    pub number_of_clips: i64,                                         // 4128
    pub maximum_clip_bytes: i64,                                      // 4136
    pub video_format: FixedString<METADATA_VIDEO_FORMAT_BYTES>,       // 4144..4272
    pub video_file_crc: u32,                                          // 4272
    pub protected_region: Region<VMD2_PROTECTED_REGION_BYTES>,        // 4276..7512
    pub discretionary_region: Region<VMD2_DISCRETIONARY_REGION_BYTES>, // 7512..10752
}

impl Default for VideoSection2 {
    fn default() -> Self {
        Self {
            channel_description: FixedString::default(),
            session_description: FixedString::default(),
            recording_duration: 0,
            horizontal_resolution: 0,
            vertical_resolution: 0,
            frame_rate: FREQUENCY_NO_ENTRY,
            number_of_clips: 0,
            maximum_clip_bytes: 0,
            video_format: FixedString::default(),
            video_file_crc: 0,
            protected_region: Region::default(),
            discretionary_region: Region::default(),
        }
    }
}

/// Section 2, by channel type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "channel_type", rename_all = "snake_case")]
pub enum Section2 {
    TimeSeries(Box<TimeSeriesSection2>),
    Video(Box<VideoSection2>),
}

impl Section2 {
    pub fn recording_duration(&self) -> i64 {
        match self {
            Section2::TimeSeries(s) => s.recording_duration,
            Section2::Video(s) => s.recording_duration,
        }
    }

    pub fn as_time_series(&self) -> Option<&TimeSeriesSection2> {
        match self {
            Section2::TimeSeries(s) => Some(s),
            Section2::Video(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoSection2> {
        match self {
            Section2::Video(s) => Some(s),
            Section2::TimeSeries(_) => None,
        }
    }
}

/// Section 3 (3072 bytes): subject and recording-site information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataSection3 {
    pub recording_time_offset: i64,                                    // 0
    pub dst_start_time: i64,                                           // 8
    pub dst_end_time: i64,                                             // 16
    pub gmt_offset: i32,                                               // 24
    pub subject_name_1: FixedString<METADATA_SUBJECT_NAME_BYTES>,      // 28..156
    pub subject_name_2: FixedString<METADATA_SUBJECT_NAME_BYTES>,      // 156..284
    pub subject_id: FixedString<METADATA_SUBJECT_ID_BYTES>,            // 284..412
    pub recording_location: FixedString<METADATA_RECORDING_LOCATION_BYTES>, // 412..924
    pub protected_region: Region<MD3_PROTECTED_REGION_BYTES>,          // 924..2048
    pub discretionary_region: Region<MD3_DISCRETIONARY_REGION_BYTES>,  // 2048..3072
}

impl Default for MetadataSection3 {
    fn default() -> Self {
        Self {
            recording_time_offset: 0,
            dst_start_time: UUTC_NO_ENTRY,
            dst_end_time: UUTC_NO_ENTRY,
            gmt_offset: GMT_OFFSET_NO_ENTRY,
            subject_name_1: FixedString::default(),
            subject_name_2: FixedString::default(),
            subject_id: FixedString::default(),
            recording_location: FixedString::default(),
            protected_region: Region::default(),
            discretionary_region: Region::default(),
        }
    }
}

/// A decoded, decrypted metadata file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub universal_header: UniversalHeader,
    pub section_1: MetadataSection1,
    pub section_2: Section2,
    pub section_3: MetadataSection3,
}

impl Metadata {
    pub fn time_series(&self) -> Option<&TimeSeriesSection2> {
        self.section_2.as_time_series()
    }

    pub fn video(&self) -> Option<&VideoSection2> {
        self.section_2.as_video()
    }
}
