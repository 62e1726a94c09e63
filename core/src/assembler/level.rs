//! assembler/level.rs
//! Steps shared by the session, channel and segment levels.

use std::path::Path;

use crate::assembler::io::ReadContext;
use crate::assembler::layout::level_file;
use crate::constants::UUID_BYTES;
use crate::headers::{FileType, UniversalHeader};
use crate::records::{decode_record_indices, decode_record_stream, RecordIndex, RecordStream};
use crate::telemetry::Stage;
use crate::types::{Diagnostic, MefError, WithLocation};

/// Records of the level stored in `dir`.
///
/// A level without a `.rdat` file, or a read that skips records, yields an
/// empty stream. A record file that cannot be read (bad file CRC, foreign
/// type) is suppressed with a diagnostic unless the failure policy says
/// otherwise; password errors always propagate.
pub fn read_level_records(dir: &Path, ctx: &mut ReadContext<'_>) -> Result<RecordStream, MefError> {
    let data_path = level_file(dir, FileType::RecordData);
    if !ctx.options.read_record_data || !data_path.is_file() {
        return Ok(RecordStream::default());
    }

    ctx.timed(Stage::ReadRecords, |ctx| match load_records(dir, &data_path, ctx) {
        Ok(stream) => {
            ctx.counters.merge(&stream.counters);
            ctx.diagnostics.extend(stream.diagnostics.iter().cloned());
            Ok(stream)
        }
        Err(e) if ctx.is_fatal(&e) => Err(e),
        Err(e) => {
            ctx.suppress(&e);
            Ok(RecordStream::default())
        }
    })
}

fn load_records(dir: &Path, data_path: &Path, ctx: &mut ReadContext<'_>) -> Result<RecordStream, MefError> {
    let data = ctx.read_file(data_path, FileType::RecordData)?;
    let keys = ctx.keys_for(&data.header, &data.location);
    let index = read_record_index(dir, ctx);
    decode_record_stream(
        &data.bytes,
        &data.header,
        index.as_deref(),
        &keys,
        ctx.options.crc_policy,
        &data.location,
    )
}

/// Entries of the level's `.ridx` file; problems are diagnostics only since
/// the data file alone is enough to walk the records.
fn read_record_index(dir: &Path, ctx: &mut ReadContext<'_>) -> Option<Vec<RecordIndex>> {
    let path = level_file(dir, FileType::RecordIndices);
    if !path.is_file() {
        return None;
    }
    let entries = ctx
        .read_file(&path, FileType::RecordIndices)
        .and_then(|f| decode_record_indices(f.body(), f.header.byte_order_code).at(&f.location));
    match entries {
        Ok(entries) => Some(entries),
        Err(e) => {
            ctx.diagnose(Diagnostic::from_error(Stage::ReadRecords, &e));
            None
        }
    }
}

/// Sibling files of one level must carry the same level UUID.
pub fn check_level_uuid(
    expected: &[u8; UUID_BYTES],
    header: &UniversalHeader,
    location: &str,
) -> Result<(), MefError> {
    if &header.level_uuid != expected {
        return Err(MefError::corrupt(
            location,
            format!(
                "level UUID {} differs from its siblings' {}",
                hex::encode(header.level_uuid),
                hex::encode(expected)
            ),
        ));
    }
    Ok(())
}
