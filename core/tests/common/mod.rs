//! On-disk session fixtures built with the crate's own encoders.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

use mef3_core::assembler::layout::segment_dir_name;
use mef3_core::constants::*;
use mef3_core::crypto::{derive_keys, validation_fields_for, KeySet, ValidationFields};
use mef3_core::headers::{encode_universal_header, finalize_file, ByteOrderCode, FileType, FixedString, UniversalHeader};
use mef3_core::index::{encode_time_series_indices, encode_video_indices, TimeSeriesIndex, VideoIndex};
use mef3_core::metadata::{
    encode_metadata, Metadata, MetadataSection1, MetadataSection3, Section2, TimeSeriesSection2, VideoSection2,
};
use mef3_core::records::{encode_record_stream, encode_record_indices, RecordBody, RecordHeader};
use mef3_core::utils::compute_crc;

pub const SESSION: &str = "sub-01";
pub const SAMPLING_FREQUENCY: f64 = 1000.0;
pub const BLOCK_SAMPLES: u32 = 100;
/// µs covered by one block at `SAMPLING_FREQUENCY`.
pub const BLOCK_INTERVAL: i64 = 100_000;
pub const BLOCK_BYTES: usize = 64;
pub const T0: i64 = 1_600_000_000_000_000;

pub const LEVEL_1_PASSWORD: &str = "reader";
pub const LEVEL_2_PASSWORD: &str = "curator";

pub fn uuid_for(name: &str) -> [u8; UUID_BYTES] {
    let digest = Sha256::digest(name.as_bytes());
    let mut out = [0u8; UUID_BYTES];
    out.copy_from_slice(&digest[..UUID_BYTES]);
    out
}

pub struct Fixture {
    pub dir: TempDir,
    pub session_path: PathBuf,
    pub order: ByteOrderCode,
    pub fields: ValidationFields,
    pub keys: KeySet,
}

impl Fixture {
    pub fn new(order: ByteOrderCode) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let session_path = dir.path().join(format!("{}.{}", SESSION, extensions::SESSION_DIRECTORY));
        fs::create_dir_all(&session_path).unwrap();
        Self { dir, session_path, order, fields: ValidationFields::default(), keys: KeySet::none() }
    }

    /// Session protected by both passwords.
    pub fn encrypted(order: ByteOrderCode) -> Self {
        let mut f = Self::new(order);
        f.fields = validation_fields_for(LEVEL_1_PASSWORD, Some(LEVEL_2_PASSWORD));
        f.keys = derive_keys(Some(LEVEL_1_PASSWORD), Some(LEVEL_2_PASSWORD), &f.fields).unwrap();
        f
    }

    pub fn header(&self, file_type: FileType, channel: &str, segment_number: i32, level: &str) -> UniversalHeader {
        let mut h = UniversalHeader::new(file_type);
        h.byte_order_code = self.order;
        h.segment_number = segment_number;
        h.channel_name = FixedString::new(channel).unwrap();
        h.session_name = FixedString::new(SESSION).unwrap();
        h.anonymized_name = FixedString::new("anon").unwrap();
        h.level_uuid = uuid_for(level);
        h.level_1_password_validation_field = self.fields.level_1;
        h.level_2_password_validation_field = self.fields.level_2;
        h
    }

    pub fn channel_dir(&self, channel: &str, ext: &str) -> PathBuf {
        let dir = self.session_path.join(format!("{}.{}", channel, ext));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn segment_dir(&self, channel: &str, ext: &str, number: i32) -> PathBuf {
        let dir = self.channel_dir(channel, ext).join(segment_dir_name(channel, number));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Time-series segment of `blocks` blocks starting at `start_time`,
    /// with section 2 encrypted at `section_2_encryption`.
    pub fn add_time_series_segment(
        &self,
        channel: &str,
        number: i32,
        start_time: i64,
        blocks: usize,
        section_2_encryption: i8,
    ) -> PathBuf {
        let dir = self.segment_dir(channel, extensions::TIME_SERIES_CHANNEL_DIRECTORY, number);
        let name = format!("{}-{:06}", channel, number);
        let end_time = start_time + blocks as i64 * BLOCK_INTERVAL;

        let mut data = Vec::new();
        let mut entries = Vec::new();
        for b in 0..blocks {
            let mut block = vec![b as u8 + 1; BLOCK_BYTES];
            let crc = compute_crc(&block[RED_BLOCK_CRC_START_OFFSET..]);
            self.put_u32(&mut block[..4], crc);
            entries.push(TimeSeriesIndex {
                file_offset: (UNIVERSAL_HEADER_BYTES + data.len()) as i64,
                start_time: start_time + b as i64 * BLOCK_INTERVAL,
                start_sample: b as i64 * i64::from(BLOCK_SAMPLES),
                number_of_samples: BLOCK_SAMPLES,
                block_bytes: BLOCK_BYTES as u32,
                maximum_sample_value: 100,
                minimum_sample_value: -100,
                ..TimeSeriesIndex::default()
            });
            data.extend_from_slice(&block);
        }

        let mut h = self.header(FileType::TimeSeriesData, channel, number, &name);
        h.start_time = start_time;
        h.end_time = end_time;
        h.number_of_entries = blocks as i64;
        h.maximum_entry_size = BLOCK_SAMPLES as i64;
        self.write_file(&dir.join(format!("{}.tdat", name)), &h, &data);

        h.file_type_string = FileType::TimeSeriesIndices.type_string();
        h.maximum_entry_size = TimeSeriesIndex::LEN as i64;
        self.write_file(&dir.join(format!("{}.tidx", name)), &h, &encode_time_series_indices(&entries, self.order));

        let samples = blocks as i64 * i64::from(BLOCK_SAMPLES);
        let section_2 = TimeSeriesSection2 {
            channel_description: FixedString::new(&format!("{} electrode", channel)).unwrap(),
            session_description: FixedString::new("overnight").unwrap(),
            recording_duration: end_time - start_time,
            sampling_frequency: SAMPLING_FREQUENCY,
            low_frequency_filter_setting: 0.1,
            high_frequency_filter_setting: 300.0,
            units_conversion_factor: 1.0,
            units_description: FixedString::new("microvolts").unwrap(),
            maximum_native_sample_value: 100.0,
            minimum_native_sample_value: -100.0,
            start_sample: i64::from(number) * samples,
            number_of_samples: samples,
            number_of_blocks: blocks as i64,
            maximum_block_bytes: BLOCK_BYTES as i64,
            maximum_block_samples: BLOCK_SAMPLES,
            block_interval: BLOCK_INTERVAL,
            maximum_contiguous_blocks: blocks as i64,
            ..TimeSeriesSection2::default()
        };
        self.write_metadata(&dir, &name, channel, number, start_time, end_time, Section2::TimeSeries(Box::new(section_2)), section_2_encryption);
        dir
    }

    pub fn add_video_segment(&self, channel: &str, number: i32, start_time: i64, clips: usize) -> PathBuf {
        let dir = self.segment_dir(channel, extensions::VIDEO_CHANNEL_DIRECTORY, number);
        let name = format!("{}-{:06}", channel, number);
        let end_time = start_time + clips as i64 * 1_000_000;

        let entries: Vec<VideoIndex> = (0..clips)
            .map(|c| VideoIndex {
                start_time: start_time + c as i64 * 1_000_000,
                end_time: start_time + (c as i64 + 1) * 1_000_000,
                start_frame: c as u32 * 30,
                end_frame: (c as u32 + 1) * 30 - 1,
                file_offset: 0,
                clip_bytes: 4096,
                ..VideoIndex::default()
            })
            .collect();
        let mut h = self.header(FileType::VideoIndices, channel, number, &name);
        h.start_time = start_time;
        h.end_time = end_time;
        h.number_of_entries = clips as i64;
        self.write_file(&dir.join(format!("{}.vidx", name)), &h, &encode_video_indices(&entries, self.order));

        let section_2 = VideoSection2 {
            channel_description: FixedString::new("room camera").unwrap(),
            recording_duration: end_time - start_time,
            horizontal_resolution: 640,
            vertical_resolution: 480,
            frame_rate: 30.0,
            number_of_clips: clips as i64,
            maximum_clip_bytes: 4096,
            video_format: FixedString::new("mp4").unwrap(),
            ..VideoSection2::default()
        };
        self.write_metadata(&dir, &name, channel, number, start_time, end_time, Section2::Video(Box::new(section_2)), 0);
        dir
    }

    #[allow(clippy::too_many_arguments)]
    fn write_metadata(
        &self,
        dir: &Path,
        name: &str,
        channel: &str,
        number: i32,
        start_time: i64,
        end_time: i64,
        section_2: Section2,
        section_2_encryption: i8,
    ) {
        let file_type = match section_2 {
            Section2::TimeSeries(_) => FileType::TimeSeriesMetadata,
            Section2::Video(_) => FileType::VideoMetadata,
        };
        let mut uh = self.header(file_type, channel, number, name);
        uh.start_time = start_time;
        uh.end_time = end_time;
        uh.number_of_entries = 1;
        uh.maximum_entry_size = METADATA_FILE_BYTES as i64;

        let metadata = Metadata {
            universal_header: uh,
            section_1: MetadataSection1 { section_2_encryption, ..MetadataSection1::default() },
            section_2,
            section_3: MetadataSection3 {
                subject_name_1: FixedString::new("Ada").unwrap(),
                subject_id: FixedString::new("S-001").unwrap(),
                recording_location: FixedString::new("Ward 3").unwrap(),
                ..MetadataSection3::default()
            },
        };
        let bytes = encode_metadata(&metadata, &self.keys).unwrap();
        fs::write(dir.join(format!("{}.{}", name, file_type.extension())), bytes).unwrap();
    }

    /// `.rdat` / `.ridx` pair for the level stored in `dir`.
    pub fn add_records(&self, dir: &Path, channel: &str, segment_number: i32, records: &[(RecordHeader, RecordBody)]) {
        let stem = dir.file_stem().unwrap().to_string_lossy().into_owned();
        let (data, index) = encode_record_stream(records, self.order, &self.keys).unwrap();

        let mut h = self.header(FileType::RecordData, channel, segment_number, &stem);
        h.number_of_entries = records.len() as i64;
        if let (Some(first), Some(last)) = (records.first(), records.last()) {
            h.start_time = first.0.time;
            h.end_time = last.0.time;
        }
        self.write_file(&dir.join(format!("{}.rdat", stem)), &h, &data);

        h.file_type_string = FileType::RecordIndices.type_string();
        self.write_file(&dir.join(format!("{}.ridx", stem)), &h, &encode_record_indices(&index, self.order));
    }

    pub fn write_file(&self, path: &Path, header: &UniversalHeader, body: &[u8]) {
        let mut file = encode_universal_header(header).to_vec();
        file.extend_from_slice(body);
        finalize_file(&mut file, self.order);
        fs::write(path, file).unwrap();
    }

    fn put_u32(&self, out: &mut [u8], v: u32) {
        use byteorder::{BigEndian, ByteOrder, LittleEndian};
        match self.order {
            ByteOrderCode::LittleEndian => LittleEndian::write_u32(out, v),
            ByteOrderCode::BigEndian => BigEndian::write_u32(out, v),
        }
    }
}

pub fn note(time: i64, text: &str) -> (RecordHeader, RecordBody) {
    (
        RecordHeader::new(mef3_core::records::RecordType::Note, time),
        RecordBody::Note { text: text.to_string() },
    )
}

/// Flip one byte of a file in place.
pub fn corrupt_byte(path: &Path, offset: usize) {
    let mut bytes = fs::read(path).unwrap();
    bytes[offset] ^= 0xFF;
    fs::write(path, bytes).unwrap();
}
