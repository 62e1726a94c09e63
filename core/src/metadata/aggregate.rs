//! metadata/aggregate.rs
//! Channel- and session-level metadata views built from their children.
//!
//! Segments of a channel follow one another in time, so their counts add up.
//! Channels of a session run side by side, so counts take the maximum and
//! settings that disagree are cleared.

use crate::constants::*;
use crate::headers::FixedString;
use crate::metadata::types::*;
use crate::utils::{earliest_uutc, latest_uutc};

/// How children relate in time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MergeMode {
    /// Segments of one channel.
    Serial,
    /// Channels of one session.
    Parallel,
}

impl MergeMode {
    fn count(self, a: i64, b: i64) -> i64 {
        match self {
            MergeMode::Serial => a.saturating_add(b),
            MergeMode::Parallel => a.max(b),
        }
    }
}

fn keep_if_equal_f64(acc: &mut f64, next: f64, cleared: f64) {
    if *acc != next {
        *acc = cleared;
    }
}

fn keep_if_equal_text<const N: usize>(acc: &mut FixedString<N>, next: &FixedString<N>) {
    if acc.text() != next.text() {
        *acc = FixedString::default();
    }
}

fn merge_time_series(acc: &mut TimeSeriesSection2, next: &TimeSeriesSection2, mode: MergeMode) {
    acc.recording_duration = mode.count(acc.recording_duration, next.recording_duration);
    acc.number_of_samples = mode.count(acc.number_of_samples, next.number_of_samples);
    acc.number_of_blocks = mode.count(acc.number_of_blocks, next.number_of_blocks);
    acc.number_of_discontinuities = mode.count(acc.number_of_discontinuities, next.number_of_discontinuities);

    acc.maximum_block_bytes = acc.maximum_block_bytes.max(next.maximum_block_bytes);
    acc.maximum_block_samples = acc.maximum_block_samples.max(next.maximum_block_samples);
    acc.maximum_difference_bytes = acc.maximum_difference_bytes.max(next.maximum_difference_bytes);
    acc.block_interval = acc.block_interval.max(next.block_interval);
    acc.maximum_contiguous_blocks = acc.maximum_contiguous_blocks.max(next.maximum_contiguous_blocks);
    acc.maximum_contiguous_block_bytes = acc.maximum_contiguous_block_bytes.max(next.maximum_contiguous_block_bytes);
    acc.maximum_contiguous_samples = acc.maximum_contiguous_samples.max(next.maximum_contiguous_samples);
    acc.maximum_native_sample_value = acc.maximum_native_sample_value.max(next.maximum_native_sample_value);
    acc.minimum_native_sample_value = acc.minimum_native_sample_value.min(next.minimum_native_sample_value);

    if next.start_sample != SAMPLE_NUMBER_NO_ENTRY
        && (acc.start_sample == SAMPLE_NUMBER_NO_ENTRY || next.start_sample < acc.start_sample)
    {
        acc.start_sample = next.start_sample;
    }

    if mode == MergeMode::Parallel {
        keep_if_equal_text(&mut acc.channel_description, &next.channel_description);
        keep_if_equal_text(&mut acc.reference_description, &next.reference_description);
        keep_if_equal_text(&mut acc.units_description, &next.units_description);
        keep_if_equal_f64(&mut acc.sampling_frequency, next.sampling_frequency, FREQUENCY_NO_ENTRY);
        keep_if_equal_f64(&mut acc.low_frequency_filter_setting, next.low_frequency_filter_setting, FREQUENCY_NO_ENTRY);
        keep_if_equal_f64(&mut acc.high_frequency_filter_setting, next.high_frequency_filter_setting, FREQUENCY_NO_ENTRY);
        keep_if_equal_f64(&mut acc.notch_filter_frequency_setting, next.notch_filter_frequency_setting, FREQUENCY_NO_ENTRY);
        keep_if_equal_f64(&mut acc.ac_line_frequency, next.ac_line_frequency, FREQUENCY_NO_ENTRY);
        keep_if_equal_f64(&mut acc.units_conversion_factor, next.units_conversion_factor, 0.0);
        if acc.acquisition_channel_number != next.acquisition_channel_number {
            acc.acquisition_channel_number = 0;
        }
    }
}

fn merge_video(acc: &mut VideoSection2, next: &VideoSection2, mode: MergeMode) {
    acc.recording_duration = mode.count(acc.recording_duration, next.recording_duration);
    acc.number_of_clips = mode.count(acc.number_of_clips, next.number_of_clips);
    acc.maximum_clip_bytes = acc.maximum_clip_bytes.max(next.maximum_clip_bytes);

    if mode == MergeMode::Parallel {
        keep_if_equal_text(&mut acc.channel_description, &next.channel_description);
        keep_if_equal_text(&mut acc.video_format, &next.video_format);
        keep_if_equal_f64(&mut acc.frame_rate, next.frame_rate, FREQUENCY_NO_ENTRY);
        if acc.horizontal_resolution != next.horizontal_resolution {
            acc.horizontal_resolution = 0;
        }
        if acc.vertical_resolution != next.vertical_resolution {
            acc.vertical_resolution = 0;
        }
        if acc.video_file_crc != next.video_file_crc {
            acc.video_file_crc = 0;
        }
    }
}

fn merge_section_3(acc: &mut MetadataSection3, next: &MetadataSection3) {
    keep_if_equal_text(&mut acc.subject_name_1, &next.subject_name_1);
    keep_if_equal_text(&mut acc.subject_name_2, &next.subject_name_2);
    keep_if_equal_text(&mut acc.subject_id, &next.subject_id);
    keep_if_equal_text(&mut acc.recording_location, &next.recording_location);
}

/// Fold `next` into `acc`.
///
/// Section 2 of a different channel type than `acc` is ignored.
pub fn merge_into(acc: &mut Metadata, next: &Metadata, mode: MergeMode) {
    let (uh, nh) = (&mut acc.universal_header, &next.universal_header);
    uh.start_time = earliest_uutc(uh.start_time, nh.start_time);
    uh.end_time = latest_uutc(uh.end_time, nh.end_time);
    uh.number_of_entries = mode.count(uh.number_of_entries, nh.number_of_entries);
    uh.maximum_entry_size = uh.maximum_entry_size.max(nh.maximum_entry_size);

    match (&mut acc.section_2, &next.section_2) {
        (Section2::TimeSeries(a), Section2::TimeSeries(n)) => merge_time_series(a, n, mode),
        (Section2::Video(a), Section2::Video(n)) => merge_video(a, n, mode),
        _ => {}
    }

    if mode == MergeMode::Parallel {
        merge_section_3(&mut acc.section_3, &next.section_3);
    }
}

/// Merge children into one view, or `None` when there are none.
///
/// The first child supplies every field the merge rules leave alone; the
/// result is relabelled as channel level (`Serial`) or session level
/// (`Parallel`).
pub fn aggregate<'a, I>(children: I, mode: MergeMode) -> Option<Metadata>
where
    I: IntoIterator<Item = &'a Metadata>,
{
    let mut iter = children.into_iter();
    let mut acc = iter.next()?.clone();
    for next in iter {
        merge_into(&mut acc, next, mode);
    }

    let uh = &mut acc.universal_header;
    match mode {
        MergeMode::Serial => uh.segment_number = UH_CHANNEL_LEVEL_CODE,
        MergeMode::Parallel => {
            uh.segment_number = UH_SESSION_LEVEL_CODE;
            uh.channel_name = FixedString::default();
        }
    }
    Some(acc)
}
