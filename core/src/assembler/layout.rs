//! assembler/layout.rs
//! MEF3 directory layout.
//!
//! ```text
//! <session>.mefd/
//!     <session>.rdat, <session>.ridx
//!     <channel>.timd/ | <channel>.vidd/
//!         <channel>.rdat, <channel>.ridx
//!         <channel>-000000.segd/
//!             <channel>-000000.tmet, .tdat, .tidx   (time series)
//!             <channel>-000000.vmet, .vidx          (video)
//!             <channel>-000000.rdat, .ridx
//! ```
//! Every level names its files after its own directory stem.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::extensions::*;
use crate::headers::FileType;
use crate::types::MefError;

/// Kind of a channel, from its directory extension.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    TimeSeries,
    Video,
}

impl ChannelType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            TIME_SERIES_CHANNEL_DIRECTORY => Some(ChannelType::TimeSeries),
            VIDEO_CHANNEL_DIRECTORY => Some(ChannelType::Video),
            _ => None,
        }
    }

    pub fn directory_extension(self) -> &'static str {
        match self {
            ChannelType::TimeSeries => TIME_SERIES_CHANNEL_DIRECTORY,
            ChannelType::Video => VIDEO_CHANNEL_DIRECTORY,
        }
    }

    pub fn metadata_file(self) -> FileType {
        match self {
            ChannelType::TimeSeries => FileType::TimeSeriesMetadata,
            ChannelType::Video => FileType::VideoMetadata,
        }
    }

    pub fn indices_file(self) -> FileType {
        match self {
            ChannelType::TimeSeries => FileType::TimeSeriesIndices,
            ChannelType::Video => FileType::VideoIndices,
        }
    }
}

/// File or directory name without its extension.
pub fn stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

pub fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// `<dir>/<stem of dir>.<ext of file_type>`
pub fn level_file(dir: &Path, file_type: FileType) -> PathBuf {
    dir.join(format!("{}.{}", stem(dir), file_type.extension()))
}

pub fn segment_dir_name(channel_name: &str, segment_number: i32) -> String {
    format!("{}-{:06}.{}", channel_name, segment_number, SEGMENT_DIRECTORY)
}

/// Segment number encoded in a segment name (`<channel>-NNNNNN`).
pub fn segment_number_from_name(name: &str) -> Option<i32> {
    let (_, digits) = name.rsplit_once('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Subdirectories of `dir` whose extension is one of `extensions`, sorted by
/// name.
pub fn child_dirs(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, MefError> {
    let entries = std::fs::read_dir(dir).map_err(|e| MefError::io(dir, e))?;
    let mut out = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MefError::io(dir, e))?.path();
        if path.is_dir() && extension(&path).is_some_and(|ext| extensions.contains(&ext)) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Directory must exist and carry extension `ext`.
pub fn expect_dir(path: &Path, ext: &str) -> Result<(), MefError> {
    let meta = std::fs::metadata(path).map_err(|e| MefError::io(path, e))?;
    if !meta.is_dir() {
        return Err(MefError::corrupt(path.display().to_string(), "not a directory"));
    }
    if extension(path) != Some(ext) {
        return Err(MefError::corrupt(
            path.display().to_string(),
            format!("expected a .{} directory", ext),
        ));
    }
    Ok(())
}
