//! assembler/segment.rs
//! Segment level: metadata, index, optional sample blocks and records of
//! one `.segd` directory.
//!
//! States: Open → ReadUniversalHeader → ReadMetadata (→ Decrypt) →
//! ReadIndex → ReadData → ReadRecords → Assembled. The context's `stage`
//! holds the state reached when an error is returned.

use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

use crate::assembler::io::{MefFile, ReadContext};
use crate::assembler::layout::{expect_dir, level_file, segment_number_from_name, stem, ChannelType};
use crate::assembler::level::{check_level_uuid, read_level_records};
use crate::assembler::model::{Aggregates, SampleBlock, Segment};
use crate::assembler::options::CrcPolicy;
use crate::constants::extensions::SEGMENT_DIRECTORY;
use crate::constants::{METADATA_SECTION_1_OFFSET, RED_BLOCK_CRC_START_OFFSET};
use crate::headers::{ByteOrderCode, FileType};
use crate::index::{decode_time_series_indices, decode_video_indices, first_out_of_order, SegmentIndex, TimeSeriesIndex};
use crate::metadata::{decode_metadata, Metadata};
use crate::telemetry::Stage;
use crate::types::{Diagnostic, ErrorKind, MefError, WithLocation};
use crate::utils::{compute_crc, format_uutc};

/// Read one segment directory.
///
/// Errors are fatal to the segment: unreadable or corrupt metadata/index
/// files, a level UUID shared by no sibling, password errors, and (under
/// `CrcPolicy::Strict`) block CRC failures. Record-level problems are
/// diagnostics in `ctx`.
pub fn assemble_segment(
    path: &Path,
    channel_type: ChannelType,
    ctx: &mut ReadContext<'_>,
) -> Result<Segment, MefError> {
    ctx.stage = Stage::Open;
    expect_dir(path, SEGMENT_DIRECTORY)?;
    let name = stem(path);

    let metadata_file = ctx.timed(Stage::ReadUniversalHeader, |ctx| {
        ctx.read_file(&level_file(path, channel_type.metadata_file()), channel_type.metadata_file())
    })?;
    let metadata = read_metadata(metadata_file, ctx)?;
    let uh = &metadata.universal_header;
    let level_uuid = uh.level_uuid;

    if let Some(from_name) = segment_number_from_name(&name) {
        if from_name != uh.segment_number {
            ctx.diagnose(Diagnostic::new(
                path.display().to_string(),
                Stage::ReadMetadata,
                ErrorKind::CorruptData,
                format!("directory names segment {}, metadata says {}", from_name, uh.segment_number),
            ));
        }
    }

    let wants_data = channel_type == ChannelType::TimeSeries && ctx.options.read_time_series_data;
    let index = if ctx.options.read_indices || wants_data {
        Some(ctx.timed(Stage::ReadIndex, |ctx| read_index(path, channel_type, &level_uuid, ctx))?)
    } else {
        None
    };

    let (data_universal_header, sample_blocks) = match channel_type {
        ChannelType::Video => (None, None),
        ChannelType::TimeSeries => ctx.timed(Stage::ReadData, |ctx| {
            let data_path = level_file(path, FileType::TimeSeriesData);
            if !wants_data {
                let header = ctx.read_header(&data_path, FileType::TimeSeriesData)?;
                check_level_uuid(&level_uuid, &header, &data_path.display().to_string())?;
                return Ok::<_, MefError>((Some(header), None));
            }
            let data = ctx.read_file(&data_path, FileType::TimeSeriesData)?;
            check_level_uuid(&level_uuid, &data.header, &data.location)?;
            let entries = index.as_ref().map(|i| i.time_series()).unwrap_or(&[]);
            let blocks = read_sample_blocks(&data, entries, ctx)?;
            Ok((Some(data.header), Some(blocks)))
        })?,
    };

    let stream = read_level_records(path, ctx)?;
    let aggregates = Aggregates {
        earliest_start_time: metadata.universal_header.start_time,
        latest_end_time: metadata.universal_header.end_time,
        maximum_number_of_records: stream.records.len() as i64,
        maximum_record_bytes: stream.maximum_record_bytes(),
    };

    ctx.stage = Stage::Assembled;
    ctx.counters.segments_read += 1;
    debug!(segment = %name, records = stream.records.len(), "segment assembled");

    let uh = &metadata.universal_header;
    Ok(Segment {
        channel_type,
        name,
        path: path.to_path_buf(),
        channel_name: uh.channel_name.text().into_owned(),
        session_name: uh.session_name.text().into_owned(),
        level_uuid,
        segment_number: uh.segment_number,
        index: index.filter(|_| ctx.options.read_indices),
        records: stream.records,
        data_universal_header,
        sample_blocks,
        aggregates,
        metadata,
    })
}

fn read_metadata(file: MefFile, ctx: &mut ReadContext<'_>) -> Result<Metadata, MefError> {
    let keys = ctx.keys_for(&file.header, &file.location);
    let encrypted = file
        .bytes
        .get(METADATA_SECTION_1_OFFSET..METADATA_SECTION_1_OFFSET + 2)
        .map_or(0, |flags| flags.iter().filter(|&&f| (f as i8) > 0).count());
    let stage = if encrypted > 0 { Stage::Decrypt } else { Stage::ReadMetadata };

    let MefFile { location, header, bytes } = file;
    let metadata = ctx.timed(stage, |_| decode_metadata(header, &bytes, &keys)).at(&location)?;
    ctx.counters.sections_decrypted += encrypted as u64;
    Ok(metadata)
}

fn read_index(
    dir: &Path,
    channel_type: ChannelType,
    level_uuid: &[u8; 16],
    ctx: &mut ReadContext<'_>,
) -> Result<SegmentIndex, MefError> {
    let file = ctx.read_file(&level_file(dir, channel_type.indices_file()), channel_type.indices_file())?;
    check_level_uuid(level_uuid, &file.header, &file.location)?;
    let (order, expected) = (file.header.byte_order_code, file.header.number_of_entries);

    let (index, out_of_order) = match channel_type {
        ChannelType::TimeSeries => {
            let entries = decode_time_series_indices(file.body(), expected, order).at(&file.location)?;
            let bad = first_out_of_order(&entries, |e| e.start_time).and_then(|i| entries.get(i).map(|e| (i, e.start_time)));
            (SegmentIndex::TimeSeries(entries), bad)
        }
        ChannelType::Video => {
            let entries = decode_video_indices(file.body(), expected, order).at(&file.location)?;
            let bad = first_out_of_order(&entries, |e| e.start_time).and_then(|i| entries.get(i).map(|e| (i, e.start_time)));
            (SegmentIndex::Video(entries), bad)
        }
    };
    if let Some((i, start_time)) = out_of_order {
        ctx.diagnose(Diagnostic::new(
            file.location.clone(),
            Stage::ReadIndex,
            ErrorKind::CorruptData,
            format!("index entry {} starts at {}, before its predecessor", i, format_uutc(start_time)),
        ));
    }
    ctx.counters.index_entries += index.len() as u64;
    Ok(index)
}

/// Raw RED blocks addressed by `entries`, each checked against its block CRC.
fn read_sample_blocks(
    data: &MefFile,
    entries: &[TimeSeriesIndex],
    ctx: &mut ReadContext<'_>,
) -> Result<Vec<SampleBlock>, MefError> {
    let read_u32: fn(&[u8]) -> u32 = match data.header.byte_order_code {
        ByteOrderCode::LittleEndian => LittleEndian::read_u32,
        ByteOrderCode::BigEndian => BigEndian::read_u32,
    };
    let policy = ctx.options.crc_policy;

    let mut blocks = Vec::with_capacity(entries.len());
    for (i, e) in entries.iter().enumerate() {
        let start = usize::try_from(e.file_offset).unwrap_or(usize::MAX);
        let len = e.block_bytes as usize;
        let bytes = start
            .checked_add(len)
            .and_then(|end| data.bytes.get(start..end))
            .filter(|b| b.len() >= RED_BLOCK_CRC_START_OFFSET)
            .ok_or_else(|| {
                MefError::corrupt(
                    data.location.as_str(),
                    format!("block {} ({} bytes at offset {}) lies outside the data file", i, len, e.file_offset),
                )
            })?;

        let block_crc = read_u32(bytes);
        if policy.checks() {
            let actual = compute_crc(&bytes[RED_BLOCK_CRC_START_OFFSET..]);
            if actual != block_crc {
                ctx.counters.crc_failures += 1;
                let error = MefError::Checksum {
                    expected: block_crc,
                    actual,
                    location: format!("{} block {}", data.location, i),
                };
                if policy == CrcPolicy::Strict {
                    return Err(error);
                }
                ctx.diagnose(Diagnostic::from_error(Stage::ReadData, &error));
            }
        }

        ctx.counters.data_blocks_read += 1;
        blocks.push(SampleBlock {
            index: i,
            file_offset: e.file_offset,
            start_time: e.start_time,
            start_sample: e.start_sample,
            number_of_samples: e.number_of_samples,
            block_crc,
            bytes: bytes.to_vec(),
        });
    }
    Ok(blocks)
}
