//! assembler/session.rs
//! Session level and the public read entry points.
//!
//! Design notes:
//! - Channels are assembled in directory-name order. With
//!   `parallel_channels` they are handed to scoped workers over a bounded
//!   channel; each worker has its own `ReadContext` and results are put back
//!   in directory order, so the tree does not depend on scheduling.
//! - Diagnostics are sorted before the session is returned.

use std::path::{Path, PathBuf};
use std::thread;

use crossbeam::channel::{bounded, unbounded};
use tracing::info;

use crate::assembler::channel::assemble_channel;
use crate::assembler::io::ReadContext;
use crate::assembler::layout::{child_dirs, expect_dir, stem, ChannelType};
use crate::assembler::level::read_level_records;
use crate::assembler::model::{Aggregates, Channel, Session};
use crate::assembler::options::{BehaviorOnFail, ReadOptions};
use crate::constants::extensions::{SESSION_DIRECTORY, TIME_SERIES_CHANNEL_DIRECTORY, VIDEO_CHANNEL_DIRECTORY};
use crate::constants::UUID_BYTES;
use crate::metadata::{aggregate, MergeMode};
use crate::telemetry::{ReadTelemetry, ReadTimer, Stage};
use crate::types::MefError;
use crate::utils::format_uutc;

/// Read a whole `.mefd` session.
///
/// `password` may be the level 1 or the level 2 password; data encrypted
/// above the level it unlocks cannot be read and fails the request.
///
/// # Errors
/// - `Io` when `path` does not exist or cannot be listed.
/// - `Password` when encrypted data is reached with a missing or wrong
///   password, whatever the failure policy.
/// - Any channel failure under `BehaviorOnFail::ExitOnFail`.
pub fn read_session(
    path: impl AsRef<Path>,
    password: Option<&str>,
    read_time_series_data: bool,
    read_record_data: bool,
    behavior_on_fail: BehaviorOnFail,
) -> Result<Session, MefError> {
    let options = ReadOptions::new(password, read_time_series_data, read_record_data, behavior_on_fail);
    read_session_with(path, &options)
}

/// `read_session` with every read option spelled out.
pub fn read_session_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Session, MefError> {
    let path = path.as_ref();
    let mut timer = ReadTimer::new();
    let mut ctx = ReadContext::new(options);

    ctx.stage = Stage::Open;
    expect_dir(path, SESSION_DIRECTORY)?;
    let dirs = child_dirs(path, &[TIME_SERIES_CHANNEL_DIRECTORY, VIDEO_CHANNEL_DIRECTORY])?;

    let results = if options.parallel_channels && dirs.len() > 1 {
        assemble_channels_parallel(&dirs, &mut ctx)
    } else {
        dirs.iter()
            .map(|dir| {
                let result = assemble_channel(dir, &mut ctx);
                (result, ctx.stage)
            })
            .collect()
    };

    let mut time_series_channels = Vec::new();
    let mut video_channels = Vec::new();
    for (result, stage) in results {
        match result {
            Ok(channel) => match channel.channel_type {
                ChannelType::TimeSeries => time_series_channels.push(channel),
                ChannelType::Video => video_channels.push(channel),
            },
            Err(e) if ctx.is_fatal(&e) => return Err(e),
            Err(e) => {
                ctx.stage = stage;
                ctx.suppress(&e);
            }
        }
    }

    let stream = read_level_records(path, &mut ctx)?;

    ctx.stage = Stage::ReadMetadata;
    let time_series_metadata = aggregate(time_series_channels.iter().filter_map(|c| c.metadata.as_ref()), MergeMode::Parallel);
    let video_metadata = aggregate(video_channels.iter().filter_map(|c| c.metadata.as_ref()), MergeMode::Parallel);

    let mut aggregates = Aggregates::fold(
        time_series_channels.iter().chain(&video_channels).map(|c| &c.aggregates),
    );
    aggregates.include_records(stream.records.len() as i64, stream.maximum_record_bytes());

    let (anonymized_name, level_uuid) = time_series_channels
        .iter()
        .chain(&video_channels)
        .find(|c| c.metadata.is_some())
        .map(|c| (c.anonymized_name.clone(), c.level_uuid))
        .unwrap_or((String::new(), [0u8; UUID_BYTES]));

    ctx.stage = Stage::Assembled;
    ctx.diagnostics.sort();
    timer.stage_times = std::mem::take(&mut ctx.stage_times);
    timer.finish();
    let telemetry = ReadTelemetry::from(&ctx.counters, &timer);

    info!(
        session = %path.display(),
        channels = time_series_channels.len() + video_channels.len(),
        start = %format_uutc(aggregates.earliest_start_time),
        end = %format_uutc(aggregates.latest_end_time),
        diagnostics = ctx.diagnostics.len(),
        metadata_ms = telemetry.stage_times.get_ms(Stage::ReadMetadata),
        decrypt_ms = telemetry.stage_times.get_ms(Stage::Decrypt),
        records_ms = telemetry.stage_times.get_ms(Stage::ReadRecords),
        elapsed_ms = telemetry.elapsed.as_millis() as u64,
        "session read"
    );

    Ok(Session {
        name: stem(path),
        path: path.to_path_buf(),
        anonymized_name,
        level_uuid,
        time_series_channels,
        video_channels,
        time_series_metadata,
        video_metadata,
        records: stream.records,
        aggregates,
        diagnostics: ctx.diagnostics,
        telemetry,
    })
}

/// Assemble channel directories on worker threads.
///
/// Returns one result per directory, in directory order, with the state each
/// channel reached. Worker contexts are folded into `ctx`.
fn assemble_channels_parallel(
    dirs: &[PathBuf],
    ctx: &mut ReadContext<'_>,
) -> Vec<(Result<Channel, MefError>, Stage)> {
    let workers = thread::available_parallelism().map_or(1, |n| n.get()).min(dirs.len());
    let (job_tx, job_rx) = bounded::<(usize, &Path)>(dirs.len());
    let (out_tx, out_rx) = unbounded();

    for (i, dir) in dirs.iter().enumerate() {
        if job_tx.send((i, dir.as_path())).is_err() {
            break;
        }
    }
    drop(job_tx);

    let contexts: Vec<ReadContext<'_>> = (0..workers).map(|_| ctx.child()).collect();
    let finished: Vec<ReadContext<'_>> = thread::scope(|scope| {
        let handles: Vec<_> = contexts
            .into_iter()
            .map(|mut worker_ctx| {
                let (job_rx, out_tx) = (job_rx.clone(), out_tx.clone());
                scope.spawn(move || {
                    for (i, dir) in job_rx.iter() {
                        let result = assemble_channel(dir, &mut worker_ctx);
                        if out_tx.send((i, result, worker_ctx.stage)).is_err() {
                            break;
                        }
                    }
                    worker_ctx
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });
    drop(out_tx);

    for worker_ctx in finished {
        ctx.absorb(worker_ctx);
    }
    let mut results: Vec<(usize, Result<Channel, MefError>, Stage)> = out_rx.iter().collect();
    results.sort_by_key(|(i, _, _)| *i);
    results.into_iter().map(|(_, r, stage)| (r, stage)).collect()
}
