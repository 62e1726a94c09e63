//! assembler/channel.rs
//! Channel level: every segment of a `.timd` / `.vidd` directory plus the
//! channel's own records.

use std::path::Path;

use tracing::debug;

use crate::assembler::io::ReadContext;
use crate::assembler::layout::{child_dirs, extension, stem, ChannelType};
use crate::assembler::level::read_level_records;
use crate::assembler::model::{Aggregates, Channel};
use crate::assembler::segment::assemble_segment;
use crate::constants::extensions::SEGMENT_DIRECTORY;
use crate::constants::UUID_BYTES;
use crate::metadata::{aggregate, MergeMode};
use crate::telemetry::Stage;
use crate::types::MefError;

/// Read one channel directory.
///
/// Segment failures follow the failure policy in `ctx`: suppressed ones are
/// left out with a diagnostic. A directory without segments gives a channel
/// with no segments and no metadata; one whose segments all failed is
/// `CorruptData`.
pub fn assemble_channel(path: &Path, ctx: &mut ReadContext<'_>) -> Result<Channel, MefError> {
    ctx.stage = Stage::Open;
    let location = path.display().to_string();
    let ext = extension(path).unwrap_or_default().to_owned();
    let channel_type = ChannelType::from_extension(&ext)
        .ok_or_else(|| MefError::corrupt(location.as_str(), "not a .timd or .vidd directory"))?;
    let name = stem(path);

    let dirs = child_dirs(path, &[SEGMENT_DIRECTORY])?;
    let mut segments = Vec::with_capacity(dirs.len());
    for dir in dirs.iter() {
        match assemble_segment(dir, channel_type, ctx) {
            Ok(segment) => segments.push(segment),
            Err(e) if ctx.is_fatal(&e) => return Err(e),
            Err(e) => ctx.suppress(&e),
        }
    }
    if segments.is_empty() && !dirs.is_empty() {
        ctx.stage = Stage::Open;
        return Err(MefError::corrupt(location, "no readable segments"));
    }
    segments.sort_by_key(|s| s.segment_number);

    ctx.stage = Stage::ReadMetadata;
    let metadata = aggregate(segments.iter().map(|s| &s.metadata), MergeMode::Serial);

    let stream = read_level_records(path, ctx)?;
    let mut aggregates = Aggregates::fold(segments.iter().map(|s| &s.aggregates));
    aggregates.include_records(stream.records.len() as i64, stream.maximum_record_bytes());

    ctx.stage = Stage::Assembled;
    ctx.counters.channels_read += 1;
    debug!(channel = %name, segments = segments.len(), "channel assembled");

    let (session_name, level_uuid, anonymized_name) = match segments.first() {
        Some(seg) => {
            let uh = &seg.metadata.universal_header;
            (uh.session_name.text().into_owned(), uh.level_uuid, uh.anonymized_name.text().into_owned())
        }
        None => (String::new(), [0u8; UUID_BYTES], String::new()),
    };
    Ok(Channel {
        channel_type,
        path: path.to_path_buf(),
        extension: ext,
        session_name,
        level_uuid,
        anonymized_name,
        name,
        metadata,
        segments,
        records: stream.records,
        aggregates,
    })
}
