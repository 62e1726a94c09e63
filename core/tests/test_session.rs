mod common;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use mef3_core::constants::extensions::{TIME_SERIES_CHANNEL_DIRECTORY, VIDEO_CHANNEL_DIRECTORY};
    use mef3_core::constants::{METADATA_SECTION_2_OFFSET, UNIVERSAL_HEADER_BYTES, UUTC_NO_ENTRY};
    use mef3_core::headers::{decode_universal_header, ByteOrderCode, FileType};
    use mef3_core::index::{decode_time_series_indices, encode_time_series_indices, SegmentIndex};
    use mef3_core::prelude::*;
    use mef3_core::records::{RecordHeader, RecordType};
    use mef3_core::telemetry::Stage;

    use super::common::*;

    const SECOND: i64 = 1_000_000;

    /// ch1: 3 segments, ch2: 2 segments, cam: 1 video segment, records at
    /// session and channel level.
    fn build(order: ByteOrderCode) -> Fixture {
        let f = Fixture::new(order);
        for n in 0..3 {
            f.add_time_series_segment("ch1", n, T0 + i64::from(n) * SECOND, 10, 0);
        }
        for n in 0..2 {
            f.add_time_series_segment("ch2", n, T0 + i64::from(n) * SECOND, 10, 0);
        }
        f.add_video_segment("cam", 0, T0, 4);

        let ch1 = f.channel_dir("ch1", TIME_SERIES_CHANNEL_DIRECTORY);
        f.add_records(&ch1, "ch1", -1, &[note(T0, "electrode check"), note(T0 + SECOND, "artifact")]);
        f.add_records(&f.session_path, "", -2, &[note(T0 + 5, "lights off")]);
        f
    }

    fn segment_file(f: &Fixture, channel: &str, n: i32, file_type: FileType) -> PathBuf {
        f.segment_dir(channel, TIME_SERIES_CHANNEL_DIRECTORY, n)
            .join(format!("{}-{:06}.{}", channel, n, file_type.extension()))
    }

    #[test]
    fn reads_full_tree_in_order() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, false, true, BehaviorOnFail::ExitOnFail).unwrap();

        assert_eq!(session.name, SESSION);
        let names: Vec<_> = session.time_series_channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["ch1", "ch2"]);
        assert_eq!(session.video_channels.len(), 1);
        assert_eq!(session.video_channels[0].channel_type, ChannelType::Video);

        let ch1 = session.channel("ch1").unwrap();
        let numbers: Vec<_> = ch1.segments.iter().map(|s| s.segment_number).collect();
        assert_eq!(numbers, [0, 1, 2]);
        assert_eq!(ch1.extension, TIME_SERIES_CHANNEL_DIRECTORY);
        assert_eq!(ch1.extension, ch1.channel_type.directory_extension());
        assert_eq!(ch1.session_name, SESSION);
        assert_eq!(ch1.segments[1].channel_name, "ch1");
        assert_eq!(ch1.segments[1].index.as_ref().unwrap().len(), 10);
        assert!(ch1.segments[1].data_universal_header.is_some());
        assert!(ch1.segments[1].sample_blocks.is_none());

        let cam = session.channel("cam").unwrap();
        assert_eq!(cam.extension, VIDEO_CHANNEL_DIRECTORY);
        assert_eq!(cam.segments[0].index.as_ref().unwrap().video().len(), 4);
        assert!(cam.segments[0].data_universal_header.is_none());

        assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    }

    #[test]
    fn channel_metadata_sums_segments() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, false, false, BehaviorOnFail::ExitOnFail).unwrap();
        let ch1 = session.channel("ch1").unwrap();

        let ts = ch1.metadata.as_ref().unwrap().time_series().unwrap();
        assert_eq!(ts.number_of_samples, 3 * 1000);
        assert_eq!(ts.number_of_blocks, 30);
        assert_eq!(ts.recording_duration, 3 * SECOND);
        assert_eq!(ts.sampling_frequency, SAMPLING_FREQUENCY);
        assert_eq!(ts.start_sample, 0);
        assert_eq!(ch1.metadata.as_ref().unwrap().universal_header.start_time, T0);
        assert_eq!(ch1.metadata.as_ref().unwrap().universal_header.end_time, T0 + 3 * SECOND);
        assert_eq!(ch1.metadata.as_ref().unwrap().universal_header.segment_number, mef3_core::constants::UH_CHANNEL_LEVEL_CODE);
    }

    #[test]
    fn session_metadata_merges_channels_side_by_side() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, false, false, BehaviorOnFail::ExitOnFail).unwrap();

        let md = session.time_series_metadata.as_ref().unwrap();
        let ts = md.time_series().unwrap();
        assert_eq!(ts.number_of_samples, 3000, "parallel channels take the maximum");
        assert_eq!(ts.recording_duration, 3 * SECOND);
        assert_eq!(ts.sampling_frequency, SAMPLING_FREQUENCY, "equal settings survive");
        assert!(ts.channel_description.is_empty(), "differing descriptions are cleared");
        assert_eq!(ts.session_description.text(), "overnight");
        assert_eq!(md.universal_header.segment_number, mef3_core::constants::UH_SESSION_LEVEL_CODE);
        assert!(md.universal_header.channel_name.is_empty());

        let video = session.video_metadata.as_ref().unwrap().video().unwrap();
        assert_eq!(video.number_of_clips, 4);
    }

    #[test]
    fn aggregates_fold_up_the_tree() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, false, true, BehaviorOnFail::ExitOnFail).unwrap();

        let ch1 = session.channel("ch1").unwrap();
        assert_eq!(ch1.records.len(), 2);
        assert_eq!(ch1.aggregates.earliest_start_time, T0);
        assert_eq!(ch1.aggregates.latest_end_time, T0 + 3 * SECOND);
        assert_eq!(ch1.aggregates.maximum_number_of_records, 2);
        assert!(ch1.aggregates.maximum_record_bytes > RecordHeader::LEN as i64);

        let ch2 = session.channel("ch2").unwrap();
        assert_eq!(ch2.aggregates.latest_end_time, T0 + 2 * SECOND);
        assert_eq!(ch2.aggregates.maximum_number_of_records, 0);

        assert_eq!(session.records.len(), 1);
        assert_eq!(session.aggregates.earliest_start_time, T0);
        assert_eq!(session.aggregates.latest_end_time, T0 + 4 * SECOND, "video channel ends last");
        assert_eq!(session.aggregates.maximum_number_of_records, 2);
        assert_eq!(session.aggregates.maximum_record_bytes, ch1.aggregates.maximum_record_bytes);
    }

    #[test]
    fn record_data_can_be_skipped() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, false, false, BehaviorOnFail::ExitOnFail).unwrap();
        assert!(session.records.is_empty());
        assert!(session.channels().all(|c| c.records.is_empty()));
        assert_eq!(session.telemetry.counters.records_total(), 0);
    }

    #[test]
    fn suppress_keeps_two_of_three_segments() {
        let f = build(ByteOrderCode::LittleEndian);
        corrupt_byte(&segment_file(&f, "ch1", 1, FileType::TimeSeriesMetadata), METADATA_SECTION_2_OFFSET + 10);

        let session =
            read_session(&f.session_path, None, false, true, BehaviorOnFail::SuppressAndReturnPartial).unwrap();
        let ch1 = session.channel("ch1").unwrap();
        let numbers: Vec<_> = ch1.segments.iter().map(|s| s.segment_number).collect();
        assert_eq!(numbers, [0, 2]);
        assert_eq!(ch1.metadata.as_ref().unwrap().time_series().unwrap().number_of_samples, 2000);

        assert_eq!(session.diagnostics.len(), 1);
        let d = &session.diagnostics[0];
        assert_eq!(d.kind, ErrorKind::Checksum);
        assert_eq!(d.stage, Stage::ReadUniversalHeader);
        assert!(d.location.contains("ch1-000001"), "{}", d.location);
        assert_eq!(session.telemetry.counters.failed_children, 1);
        assert_eq!(session.telemetry.counters.crc_failures, 1);
    }

    #[test]
    fn exit_on_fail_aborts_the_read() {
        let f = build(ByteOrderCode::LittleEndian);
        corrupt_byte(&segment_file(&f, "ch1", 1, FileType::TimeSeriesMetadata), METADATA_SECTION_2_OFFSET + 10);

        let err = read_session(&f.session_path, None, false, true, BehaviorOnFail::ExitOnFail).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Checksum);
        assert!(err.to_string().contains("ch1-000001"));
    }

    #[test]
    fn empty_channel_directory_is_an_empty_channel() {
        let f = build(ByteOrderCode::LittleEndian);
        f.channel_dir("ch3", TIME_SERIES_CHANNEL_DIRECTORY);

        let session = read_session(&f.session_path, None, false, true, BehaviorOnFail::ExitOnFail).unwrap();
        let ch3 = session.channel("ch3").unwrap();
        assert!(ch3.segments.is_empty());
        assert!(ch3.metadata.is_none());
        assert_eq!(ch3.aggregates, mef3_core::assembler::Aggregates::default());
        assert_eq!(ch3.sample_for_time(T0), None);

        // the empty channel takes no part in the session merge or naming
        let merged = session.time_series_metadata.as_ref().unwrap();
        assert_eq!(merged.time_series().unwrap().number_of_samples, 3000);
        assert_eq!(session.anonymized_name, "anon");
        assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    }

    #[test]
    fn channel_whose_segments_all_fail_is_still_corrupt() {
        let f = Fixture::new(ByteOrderCode::LittleEndian);
        f.add_time_series_segment("ch1", 0, T0, 4, 0);
        f.add_time_series_segment("ch2", 0, T0, 4, 0);
        corrupt_byte(&segment_file(&f, "ch2", 0, FileType::TimeSeriesMetadata), METADATA_SECTION_2_OFFSET + 10);

        let session =
            read_session(&f.session_path, None, false, true, BehaviorOnFail::SuppressAndReturnPartial).unwrap();
        assert!(session.channel("ch2").is_none());
        assert_eq!(session.telemetry.counters.failed_children, 2);
        assert!(session
            .diagnostics
            .iter()
            .any(|d| d.kind == ErrorKind::CorruptData && d.message.contains("no readable segments")));
    }

    #[test]
    fn ignoring_crcs_reads_the_damaged_segment() {
        let f = build(ByteOrderCode::LittleEndian);
        corrupt_byte(&segment_file(&f, "ch1", 1, FileType::TimeSeriesMetadata), METADATA_SECTION_2_OFFSET + 3000);

        let options = ReadOptions::default()
            .with_behavior_on_fail(BehaviorOnFail::ExitOnFail)
            .with_crc_policy(CrcPolicy::Ignore);
        let session = read_session_with(&f.session_path, &options).unwrap();
        assert_eq!(session.channel("ch1").unwrap().segments.len(), 3);
        assert_eq!(session.telemetry.counters.crc_failures, 0);
    }

    #[test]
    fn sibling_level_uuid_mismatch_is_corrupt_data() {
        let f = build(ByteOrderCode::LittleEndian);
        let mut h = f.header(FileType::TimeSeriesIndices, "ch2", 0, "somewhere-else");
        h.number_of_entries = 0;
        f.write_file(&segment_file(&f, "ch2", 0, FileType::TimeSeriesIndices), &h, &[]);

        let err = read_session(&f.session_path, None, false, false, BehaviorOnFail::ExitOnFail).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);

        let session =
            read_session(&f.session_path, None, false, false, BehaviorOnFail::SuppressAndReturnPartial).unwrap();
        assert_eq!(session.channel("ch2").unwrap().segments.len(), 1);
        assert_eq!(session.diagnostics[0].stage, Stage::ReadIndex);
    }

    #[test]
    fn sample_blocks_are_read_and_checked() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, true, false, BehaviorOnFail::ExitOnFail).unwrap();
        let seg = &session.channel("ch2").unwrap().segments[1];
        let blocks = seg.sample_blocks.as_ref().unwrap();
        assert_eq!(blocks.len(), 10);
        assert_eq!(blocks[3].bytes.len(), BLOCK_BYTES);
        assert_eq!(blocks[3].start_time, T0 + SECOND + 3 * BLOCK_INTERVAL);
        assert_eq!(session.telemetry.counters.data_blocks_read, 50);

        // Damage one block payload and re-finalize the data file so only the
        // block CRC disagrees.
        let path = segment_file(&f, "ch2", 1, FileType::TimeSeriesData);
        let mut bytes = std::fs::read(&path).unwrap();
        let at = UNIVERSAL_HEADER_BYTES + 2 * BLOCK_BYTES + 20;
        bytes[at] ^= 0x55;
        mef3_core::headers::finalize_file(&mut bytes, ByteOrderCode::LittleEndian);
        std::fs::write(&path, bytes).unwrap();

        let session = read_session(&f.session_path, None, true, false, BehaviorOnFail::ExitOnFail).unwrap();
        assert_eq!(session.diagnostics.len(), 1);
        assert_eq!(session.diagnostics[0].stage, Stage::ReadData);
        assert!(session.diagnostics[0].location.ends_with("block 2"));

        let strict = ReadOptions::new(None, true, false, BehaviorOnFail::ExitOnFail).with_crc_policy(CrcPolicy::Strict);
        let err = read_session_with(&f.session_path, &strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Checksum);
    }

    #[test]
    fn big_endian_session_reads_the_same() {
        let le = build(ByteOrderCode::LittleEndian);
        let be = build(ByteOrderCode::BigEndian);
        let a = read_session(&le.session_path, None, true, true, BehaviorOnFail::ExitOnFail).unwrap();
        let b = read_session(&be.session_path, None, true, true, BehaviorOnFail::ExitOnFail).unwrap();

        let ca = a.channel("ch1").unwrap();
        let cb = b.channel("ch1").unwrap();
        assert_eq!(ca.metadata.as_ref().map(|m| &m.section_2), cb.metadata.as_ref().map(|m| &m.section_2));
        assert_eq!(ca.aggregates, cb.aggregates);
        assert_eq!(ca.records.len(), cb.records.len());
        assert_eq!(ca.records[1].body, cb.records[1].body);
        assert_eq!(cb.segments[0].metadata.universal_header.byte_order_code, ByteOrderCode::BigEndian);
    }

    #[test]
    fn parallel_channels_build_the_same_tree() {
        let f = build(ByteOrderCode::LittleEndian);
        let sequential = ReadOptions::new(None, true, true, BehaviorOnFail::ExitOnFail);
        let parallel = sequential.clone().with_parallel_channels(true);

        let a = read_session_with(&f.session_path, &sequential).unwrap();
        let b = read_session_with(&f.session_path, &parallel).unwrap();
        assert_eq!(a.time_series_channels, b.time_series_channels);
        assert_eq!(a.video_channels, b.video_channels);
        assert_eq!(a.time_series_metadata, b.time_series_metadata);
        assert_eq!(a.telemetry.counters, b.telemetry.counters);
    }

    #[test]
    fn parallel_read_keeps_every_channel_and_diagnostic() {
        let f = build(ByteOrderCode::LittleEndian);
        f.channel_dir("ch3", TIME_SERIES_CHANNEL_DIRECTORY);
        corrupt_byte(&segment_file(&f, "ch2", 1, FileType::TimeSeriesMetadata), METADATA_SECTION_2_OFFSET + 10);

        let sequential = ReadOptions::new(None, false, true, BehaviorOnFail::SuppressAndReturnPartial);
        let parallel = sequential.clone().with_parallel_channels(true);
        let a = read_session_with(&f.session_path, &sequential).unwrap();
        let b = read_session_with(&f.session_path, &parallel).unwrap();

        let names: Vec<_> = b.channels().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["ch1", "ch2", "ch3", "cam"]);
        assert_eq!(b.diagnostics, a.diagnostics);
        assert_eq!(b.diagnostics.len(), 1);
        assert_eq!(b.telemetry.counters, a.telemetry.counters);
        assert_eq!(b.telemetry.counters.channels_read, 4);
    }

    #[test]
    fn missing_session_is_an_io_error() {
        let f = Fixture::new(ByteOrderCode::LittleEndian);
        let err = read_session(
            f.dir.path().join("nope.mefd"),
            None,
            false,
            false,
            BehaviorOnFail::SuppressAndReturnPartial,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn channel_lookups_cross_segments() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, false, false, BehaviorOnFail::ExitOnFail).unwrap();
        let ch1 = session.channel("ch1").unwrap();

        assert_eq!(ch1.sample_for_time(T0), Some(0));
        assert_eq!(ch1.sample_for_time(T0 + SECOND + 550_000), Some(1550));
        assert_eq!(ch1.time_for_sample(1550), Some(T0 + SECOND + 550_000));
        assert_eq!(ch1.sample_for_time(T0 - 1), None);

        let cam = session.channel("cam").unwrap();
        assert_eq!(cam.sample_for_time(T0), None);
    }

    #[test]
    fn lookups_do_not_overflow_on_extreme_values() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, false, false, BehaviorOnFail::ExitOnFail).unwrap();
        let mut ch1 = session.channel("ch1").unwrap().clone();

        assert_eq!(ch1.time_for_sample(i64::MAX), None);

        if let Some(SegmentIndex::TimeSeries(entries)) = &mut ch1.segments[0].index {
            entries[0].start_time = UUTC_NO_ENTRY;
        }
        assert_eq!(ch1.sample_for_time(0), None);
        assert_eq!(ch1.sample_for_time(T0 + SECOND), Some(1000));
    }

    #[test]
    fn out_of_order_index_is_reported_with_its_time() {
        let f = build(ByteOrderCode::LittleEndian);
        let path = segment_file(&f, "ch2", 1, FileType::TimeSeriesIndices);
        let file = std::fs::read(&path).unwrap();
        let header = decode_universal_header(&file).unwrap();
        let mut entries =
            decode_time_series_indices(&file[UNIVERSAL_HEADER_BYTES..], header.number_of_entries, ByteOrderCode::LittleEndian).unwrap();
        entries[3].start_time = entries[1].start_time;
        f.write_file(&path, &header, &encode_time_series_indices(&entries, ByteOrderCode::LittleEndian));

        let session = read_session(&f.session_path, None, false, false, BehaviorOnFail::ExitOnFail).unwrap();
        assert_eq!(session.diagnostics.len(), 1);
        let d = &session.diagnostics[0];
        assert_eq!(d.stage, Stage::ReadIndex);
        assert!(d.message.contains("index entry 3"), "{}", d.message);
        assert!(d.message.contains("2020-09-13T12:26:41.100"), "{}", d.message);
    }

    #[test]
    fn telemetry_counts_the_read() {
        let f = build(ByteOrderCode::LittleEndian);
        let session = read_session(&f.session_path, None, false, true, BehaviorOnFail::ExitOnFail).unwrap();
        let c = &session.telemetry.counters;
        assert_eq!(c.segments_read, 6);
        assert_eq!(c.channels_read, 3);
        assert_eq!(c.records_decoded, 3);
        assert_eq!(c.index_entries, 5 * 10 + 4);
        assert!(c.bytes_read > 0);
        assert!(session.telemetry.has_all_stages(&[Stage::ReadUniversalHeader, Stage::ReadMetadata, Stage::ReadIndex]));
    }

    #[test]
    fn unknown_records_keep_their_place() {
        let f = build(ByteOrderCode::LittleEndian);
        let ch2 = f.channel_dir("ch2", TIME_SERIES_CHANNEL_DIRECTORY);
        let mut unknown = RecordHeader::new(RecordType::Note, T0 + 10);
        unknown.type_string = *b"Zzzz\0";
        f.add_records(
            &ch2,
            "ch2",
            -1,
            &[
                note(T0, "first"),
                (unknown, RecordBody::Unrecognized { raw: vec![7; 32], diagnostic: String::new() }),
                note(T0 + 20, "third"),
            ],
        );

        let session = read_session(&f.session_path, None, false, true, BehaviorOnFail::ExitOnFail).unwrap();
        let records = &session.channel("ch2").unwrap().records;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].body, RecordBody::Note { text: "first".into() });
        assert!(!records[1].body.is_recognized());
        assert_eq!(records[1].header.type_name(), "Zzzz");
        assert_eq!(records[2].body, RecordBody::Note { text: "third".into() });
        assert_eq!(session.diagnostics.len(), 1);
        assert_eq!(session.telemetry.counters.records_unrecognized, 1);
    }
}
