#[cfg(test)]
mod tests {
    use mef3_core::constants::*;
    use mef3_core::crypto::{derive_keys, validation_fields_for, KeySet};
    use mef3_core::headers::{decode_universal_header, ByteOrderCode, FileType, FixedString, UniversalHeader};
    use mef3_core::metadata::*;
    use mef3_core::types::MefError;

    fn time_series(order: ByteOrderCode, segment: i32, start: i64, samples: i64) -> Metadata {
        let mut uh = UniversalHeader::new(FileType::TimeSeriesMetadata);
        uh.byte_order_code = order;
        uh.segment_number = segment;
        uh.start_time = start;
        uh.end_time = start + samples * 1000;
        uh.number_of_entries = 1;
        uh.channel_name = FixedString::new("LA1").unwrap();
        Metadata {
            universal_header: uh,
            section_1: MetadataSection1::default(),
            section_2: Section2::TimeSeries(Box::new(TimeSeriesSection2 {
                channel_description: FixedString::new("left amygdala").unwrap(),
                units_description: FixedString::new("microvolts").unwrap(),
                recording_duration: samples * 1000,
                sampling_frequency: 1000.0,
                start_sample: i64::from(segment) * samples,
                number_of_samples: samples,
                number_of_blocks: samples / 100,
                maximum_block_bytes: 300 + i64::from(segment),
                maximum_block_samples: 100,
                maximum_native_sample_value: 10.0 * f64::from(segment + 1),
                minimum_native_sample_value: -10.0 * f64::from(segment + 1),
                ..TimeSeriesSection2::default()
            })),
            section_3: MetadataSection3 {
                subject_name_1: FixedString::new("Ada").unwrap(),
                ..MetadataSection3::default()
            },
        }
    }

    fn round_trip(m: &Metadata, keys: &KeySet) -> Result<Metadata, MefError> {
        let file = encode_metadata(m, keys).unwrap();
        assert_eq!(file.len(), METADATA_FILE_BYTES);
        let uh = decode_universal_header(&file).unwrap();
        decode_metadata(uh, &file, keys)
    }

    // ## Codec

    #[test]
    fn plaintext_file_round_trips_in_both_orders() {
        for order in [ByteOrderCode::LittleEndian, ByteOrderCode::BigEndian] {
            let m = time_series(order, 0, 1_000, 5000);
            let back = round_trip(&m, &KeySet::none()).unwrap();
            assert_eq!(back.section_1, m.section_1);
            assert_eq!(back.section_2, m.section_2);
            assert_eq!(back.section_3, m.section_3);
        }
    }

    #[test]
    fn encrypted_sections_come_back_flagged_negative() {
        let fields = validation_fields_for("reader", Some("curator"));
        let keys = derive_keys(None, Some("curator"), &fields).unwrap();

        let mut m = time_series(ByteOrderCode::LittleEndian, 2, 1_000, 5000);
        m.universal_header.level_1_password_validation_field = fields.level_1;
        m.universal_header.level_2_password_validation_field = fields.level_2;
        m.section_1.section_2_encryption = 1;
        m.section_1.section_3_encryption = 2;

        let file = encode_metadata(&m, &keys).unwrap();
        assert!(
            !file[METADATA_SECTION_2_OFFSET..METADATA_SECTION_3_OFFSET]
                .windows(13)
                .any(|w| w == b"left amygdala"),
            "section 2 is not stored in clear"
        );

        let back = round_trip(&m, &keys).unwrap();
        assert_eq!(back.section_1.section_2_encryption, -1);
        assert_eq!(back.section_1.section_3_encryption, -2);
        assert_eq!(back.section_2, m.section_2);
        assert_eq!(back.section_3.subject_name_1.text(), "Ada");
    }

    #[test]
    fn encrypted_section_without_key_is_a_password_error() {
        let fields = validation_fields_for("reader", None);
        let keys = derive_keys(Some("reader"), None, &fields).unwrap();
        let mut m = time_series(ByteOrderCode::LittleEndian, 0, 1_000, 5000);
        m.section_1.section_3_encryption = 1;

        let file = encode_metadata(&m, &keys).unwrap();
        let uh = decode_universal_header(&file).unwrap();
        let err = decode_metadata(uh, &file, &KeySet::none()).unwrap_err();
        assert!(matches!(err, MefError::Password { level: 1, .. }));
    }

    #[test]
    fn short_file_is_rejected() {
        let m = time_series(ByteOrderCode::LittleEndian, 0, 1_000, 5000);
        let file = encode_metadata(&m, &KeySet::none()).unwrap();
        let uh = decode_universal_header(&file).unwrap();
        assert!(decode_metadata(uh, &file[..METADATA_FILE_BYTES - 1], &KeySet::none()).is_err());
    }

    #[test]
    fn non_metadata_header_is_rejected() {
        let m = time_series(ByteOrderCode::LittleEndian, 0, 1_000, 5000);
        let file = encode_metadata(&m, &KeySet::none()).unwrap();
        let wrong = UniversalHeader::new(FileType::RecordData);
        assert!(matches!(decode_metadata(wrong, &file, &KeySet::none()), Err(MefError::Header { .. })));
    }

    // ## Aggregation

    #[test]
    fn serial_merge_adds_counts_and_spans_time() {
        let segs: Vec<Metadata> = (0..3)
            .map(|n| time_series(ByteOrderCode::LittleEndian, n, 1_000 + i64::from(n) * 5_000_000, 5000))
            .collect();
        let m = aggregate(&segs, MergeMode::Serial).unwrap();
        let ts = m.time_series().unwrap();

        assert_eq!(m.universal_header.segment_number, UH_CHANNEL_LEVEL_CODE);
        assert_eq!(m.universal_header.channel_name.text(), "LA1");
        assert_eq!(m.universal_header.start_time, 1_000);
        assert_eq!(m.universal_header.end_time, segs[2].universal_header.end_time);
        assert_eq!(m.universal_header.number_of_entries, 3);
        assert_eq!(m.section_2.recording_duration(), 15_000_000);
        assert_eq!(ts.number_of_samples, 15_000);
        assert_eq!(ts.number_of_blocks, 150);
        assert_eq!(ts.start_sample, 0);
        assert_eq!(ts.maximum_block_bytes, 302);
        assert_eq!(ts.maximum_native_sample_value, 30.0);
        assert_eq!(ts.minimum_native_sample_value, -30.0);
        assert_eq!(ts.channel_description.text(), "left amygdala");
    }

    #[test]
    fn parallel_merge_takes_maxima_and_clears_disagreements() {
        let a = time_series(ByteOrderCode::LittleEndian, 0, 1_000, 5000);
        let mut b = time_series(ByteOrderCode::LittleEndian, 0, 500, 8000);
        if let Section2::TimeSeries(s) = &mut b.section_2 {
            s.channel_description = FixedString::new("right hippocampus").unwrap();
            s.sampling_frequency = 2000.0;
        }
        b.universal_header.channel_name = FixedString::new("RH1").unwrap();

        let m = aggregate([&a, &b], MergeMode::Parallel).unwrap();
        let ts = m.time_series().unwrap();

        assert_eq!(m.universal_header.segment_number, UH_SESSION_LEVEL_CODE);
        assert!(m.universal_header.channel_name.is_empty());
        assert_eq!(m.universal_header.start_time, 500);
        assert_eq!(m.universal_header.number_of_entries, 1);
        assert_eq!(ts.number_of_samples, 8000);
        assert!(ts.channel_description.is_empty());
        assert_eq!(ts.units_description.text(), "microvolts");
        assert_eq!(ts.sampling_frequency, FREQUENCY_NO_ENTRY);
        assert_eq!(m.section_3.subject_name_1.text(), "Ada");
    }

    #[test]
    fn aggregate_of_nothing_is_none() {
        assert!(aggregate(std::iter::empty::<&Metadata>(), MergeMode::Serial).is_none());
    }

    #[test]
    fn single_child_is_relabelled_only() {
        let a = time_series(ByteOrderCode::BigEndian, 4, 1_000, 5000);
        let m = aggregate([&a], MergeMode::Serial).unwrap();
        assert_eq!(m.section_2, a.section_2);
        assert_eq!(m.universal_header.segment_number, UH_CHANNEL_LEVEL_CODE);
    }

    #[test]
    fn mixed_channel_types_keep_the_first_section_2() {
        let ts = time_series(ByteOrderCode::LittleEndian, 0, 1_000, 5000);
        let mut video = ts.clone();
        video.section_2 = Section2::Video(Box::new(VideoSection2 { number_of_clips: 9, ..VideoSection2::default() }));
        let m = aggregate([&ts, &video], MergeMode::Parallel).unwrap();
        assert_eq!(m.section_2, ts.section_2);
    }
}
