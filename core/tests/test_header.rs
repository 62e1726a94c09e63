// Fixed-layout codec checks: registries, universal header validation,
// CRC handling and byte order symmetry for every structure kind.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use mef3_core::constants::*;
    use mef3_core::headers::*;
    use mef3_core::index::{RedBlockFlags, TimeSeriesIndex, VideoIndex};
    use mef3_core::metadata::{MetadataSection1, MetadataSection3, TimeSeriesSection2, VideoSection2};
    use mef3_core::records::{RecordHeader, RecordIndex, RecordType};

    const ORDERS: [ByteOrderCode; 2] = [ByteOrderCode::LittleEndian, ByteOrderCode::BigEndian];

    fn sample_universal(order: ByteOrderCode) -> UniversalHeader {
        let mut h = UniversalHeader::new(FileType::TimeSeriesIndices);
        h.byte_order_code = order;
        h.start_time = 1_600_000_000_000_000;
        h.end_time = 1_600_000_060_000_000;
        h.number_of_entries = 600;
        h.maximum_entry_size = 56;
        h.segment_number = 4;
        h.channel_name = FixedString::new("LA1").unwrap();
        h.session_name = FixedString::new("sub-01").unwrap();
        h.anonymized_name = FixedString::new("anon").unwrap();
        h.level_uuid = [7u8; UUID_BYTES];
        h.file_uuid = [8u8; UUID_BYTES];
        h.provenance_uuid = [9u8; UUID_BYTES];
        h.discretionary_region = Region([0xAB; UH_DISCRETIONARY_REGION_BYTES]);
        h
    }

    // ## 1️⃣ Registries

    #[test]
    fn byte_order_code_verify() {
        assert_eq!(ByteOrderCode::verify(0).unwrap(), ByteOrderCode::BigEndian);
        assert_eq!(ByteOrderCode::verify(1).unwrap(), ByteOrderCode::LittleEndian);
        assert_eq!(ByteOrderCode::verify(2).unwrap_err(), HeaderError::InvalidByteOrder { raw: 2 });
    }

    #[test]
    fn file_types_round_trip_their_type_strings() {
        for t in FileType::ALL {
            assert_eq!(FileType::from_type_string(&t.type_string()), Some(t));
            assert_eq!(t.type_string()[4], 0);
        }
        assert_eq!(FileType::from_type_string(b"xxxx\0"), None);
    }

    #[test]
    fn fixed_string_keeps_a_terminating_nul() {
        assert!(FixedString::<8>::new("1234567").is_ok());
        assert_eq!(
            FixedString::<8>::new("12345678").unwrap_err(),
            HeaderError::FieldTooLong { have: 8, max: 7 }
        );
        assert_eq!(FixedString::<8>::new("abc").unwrap().text(), "abc");
        assert!(FixedString::<8>::default().is_empty());
    }

    // ## 2️⃣ Universal header

    #[test]
    fn universal_header_round_trips_in_both_orders() {
        for order in ORDERS {
            let h = sample_universal(order).with_computed_crc();
            let bytes = encode_universal_header(&h);
            assert_eq!(bytes[15], order as u8);
            assert_eq!(peek_byte_order(&bytes).unwrap(), order);
            assert_eq!(decode_universal_header(&bytes).unwrap(), h);
        }
    }

    #[test]
    fn orders_differ_on_disk() {
        let le = encode_universal_header(&sample_universal(ByteOrderCode::LittleEndian));
        let be = encode_universal_header(&sample_universal(ByteOrderCode::BigEndian));
        assert_ne!(le[16..24], be[16..24]);
        assert_eq!(le[52..308], be[52..308], "text fields are order independent");
    }

    #[test]
    fn short_buffer_is_rejected() {
        let bytes = encode_universal_header(&sample_universal(ByteOrderCode::LittleEndian));
        assert_eq!(
            decode_universal_header(&bytes[..1000]).unwrap_err(),
            HeaderError::BufferTooShort { have: 1000, need: UNIVERSAL_HEADER_BYTES }
        );
    }

    #[test]
    fn invalid_byte_order_is_rejected() {
        let mut bytes = encode_universal_header(&sample_universal(ByteOrderCode::LittleEndian));
        bytes[15] = 9;
        assert_eq!(
            decode_universal_header_unchecked(&bytes).unwrap_err(),
            HeaderError::InvalidByteOrder { raw: 9 }
        );
    }

    #[test]
    fn unknown_file_type_is_rejected() {
        let mut bytes = encode_universal_header(&sample_universal(ByteOrderCode::LittleEndian));
        bytes[8..12].copy_from_slice(b"abcd");
        assert!(matches!(
            decode_universal_header_unchecked(&bytes).unwrap_err(),
            HeaderError::UnknownFileType { .. }
        ));
    }

    #[test]
    fn other_major_versions_are_unsupported() {
        let mut h = sample_universal(ByteOrderCode::BigEndian);
        h.mef_version_major = 2;
        h.mef_version_minor = 1;
        let bytes = encode_universal_header(&h);
        assert_eq!(
            decode_universal_header(&bytes).unwrap_err(),
            HeaderError::UnsupportedVersion { major: 2, minor: 1 }
        );
    }

    #[test]
    fn header_crc_mismatch_is_reported_and_skippable() {
        let mut bytes = encode_universal_header(&sample_universal(ByteOrderCode::LittleEndian));
        bytes[600] ^= 0x01;
        assert!(matches!(
            decode_universal_header(&bytes).unwrap_err(),
            HeaderError::ChecksumMismatch { .. }
        ));
        assert!(decode_universal_header_unchecked(&bytes).is_ok());
    }

    #[test]
    fn expect_file_type_names_both_sides() {
        let h = sample_universal(ByteOrderCode::LittleEndian);
        h.expect_file_type(FileType::TimeSeriesIndices).unwrap();
        let err = h.expect_file_type(FileType::RecordData).unwrap_err();
        assert_eq!(
            err,
            HeaderError::UnexpectedFileType {
                expected: FileType::RecordData,
                found: FileType::TimeSeriesIndices.type_string(),
            }
        );
        assert!(err.to_string().contains("RecordData"));
    }

    #[test]
    fn finalize_file_sets_both_crcs() {
        for order in ORDERS {
            let h = sample_universal(order);
            let mut file = encode_universal_header(&h).to_vec();
            file.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7]);
            finalize_file(&mut file, order);

            let decoded = decode_universal_header(&file).unwrap();
            assert_eq!(decoded.body_crc, mef3_core::utils::compute_crc(&file[UNIVERSAL_HEADER_BYTES..]));
        }
    }

    // ## 3️⃣ Every fixed layout, both orders

    fn every_structure() -> Vec<Header> {
        let mut record = RecordHeader::new(RecordType::Seiz, 42);
        record.record_crc = 0xDEAD_BEEF;
        record.encryption = 1;
        record.bytes = 1152;
        vec![
            Header::Universal(sample_universal(ByteOrderCode::LittleEndian).with_computed_crc()),
            Header::MetadataSection1(MetadataSection1 {
                section_2_encryption: 1,
                section_3_encryption: 2,
                ..MetadataSection1::default()
            }),
            Header::TimeSeriesSection2(Box::new(TimeSeriesSection2 {
                channel_description: FixedString::new("left amygdala").unwrap(),
                sampling_frequency: 32_556.0,
                start_sample: 1_000_000,
                number_of_blocks: 12,
                maximum_block_samples: 2048,
                ..TimeSeriesSection2::default()
            })),
            Header::VideoSection2(Box::new(VideoSection2 {
                horizontal_resolution: 1920,
                vertical_resolution: 1080,
                frame_rate: 29.97,
                video_format: FixedString::new("h264").unwrap(),
                video_file_crc: 0x1234_5678,
                ..VideoSection2::default()
            })),
            Header::MetadataSection3(Box::new(MetadataSection3 {
                gmt_offset: -18_000,
                subject_id: FixedString::new("S-7").unwrap(),
                ..MetadataSection3::default()
            })),
            Header::RecordHeader(record.clone()),
            Header::TimeSeriesIndex(TimeSeriesIndex {
                file_offset: 1024,
                start_time: -5,
                start_sample: 77,
                number_of_samples: 100,
                block_bytes: 320,
                maximum_sample_value: 9,
                minimum_sample_value: -9,
                red_block_flags: RedBlockFlags::DISCONTINUITY | RedBlockFlags::from_bits_retain(0x80),
                ..TimeSeriesIndex::default()
            }),
            Header::VideoIndex(VideoIndex {
                start_time: 10,
                end_time: 20,
                start_frame: 1,
                end_frame: 30,
                file_offset: 0,
                clip_bytes: 8192,
                ..VideoIndex::default()
            }),
            Header::RecordIndex(RecordIndex::for_record(&record, 2048)),
        ]
    }

    #[test]
    fn every_structure_round_trips_in_both_orders() {
        for order in ORDERS {
            for header in every_structure() {
                let bytes = encode_header(&header, order);
                assert_eq!(bytes.len(), header.kind().len(), "{:?}", header.kind());
                let back = decode_header(&bytes, header.kind(), order).unwrap();
                assert_eq!(back, header, "{:?} in {:?}", header.kind(), order);
            }
        }
    }

    #[test]
    fn every_structure_rejects_short_buffers() {
        for header in every_structure() {
            let kind = header.kind();
            let err = decode_header(&vec![0u8; kind.len() - 1], kind, ByteOrderCode::LittleEndian).unwrap_err();
            assert_eq!(err, HeaderError::BufferTooShort { have: kind.len() - 1, need: kind.len() });
        }
    }

    #[test]
    fn layout_sizes() {
        assert_eq!(HeaderKind::Universal.len(), 1024);
        assert_eq!(HeaderKind::MetadataSection1.len(), 1536);
        assert_eq!(HeaderKind::TimeSeriesSection2.len(), 10752);
        assert_eq!(HeaderKind::VideoSection2.len(), 10752);
        assert_eq!(HeaderKind::MetadataSection3.len(), 3072);
        assert_eq!(HeaderKind::RecordHeader.len(), 24);
        assert_eq!(HeaderKind::TimeSeriesIndex.len(), 56);
        assert_eq!(HeaderKind::VideoIndex.len(), 64);
        assert_eq!(HeaderKind::RecordIndex.len(), 24);
    }

    #[test]
    fn error_messages_are_stable() {
        assert_eq!(
            HeaderError::BufferTooShort { have: 3, need: 24 }.to_string(),
            "header buffer too short: 3 < 24"
        );
        assert_eq!(
            HeaderError::InvalidByteOrder { raw: 7 }.to_string(),
            "invalid byte order code: 0x7"
        );
        assert_eq!(
            HeaderError::UnsupportedVersion { major: 4, minor: 0 }.to_string(),
            "unsupported MEF version: 4.0"
        );
    }

    proptest! {
        #[test]
        fn prop_universal_header_round_trip(
            little in any::<bool>(),
            start in any::<i64>(),
            span in 0i64..1_000_000_000,
            entries in 0i64..1_000_000,
            segment in -3i32..10_000,
            channel in "[A-Za-z0-9_-]{0,40}",
            uuid in any::<[u8; 16]>(),
        ) {
            let order = if little { ByteOrderCode::LittleEndian } else { ByteOrderCode::BigEndian };
            let mut h = UniversalHeader::new(FileType::RecordData);
            h.byte_order_code = order;
            h.start_time = start;
            h.end_time = start.saturating_add(span);
            h.number_of_entries = entries;
            h.segment_number = segment;
            h.channel_name = FixedString::new(&channel).unwrap();
            h.level_uuid = uuid;
            let h = h.with_computed_crc();

            let decoded = decode_universal_header(&encode_universal_header(&h)).unwrap();
            prop_assert_eq!(decoded, h);
        }
    }
}
