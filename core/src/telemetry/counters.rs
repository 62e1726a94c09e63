//! telemetry/counters.rs
//! Counters collected while reading a session.
//!
//! Summary: plain integers bumped by the assemblers; per-channel counters
//! are merged into the session's at the end, so worker threads never share
//! a counter.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCounters {
    pub files_read: u64,
    pub bytes_read: u64,
    pub segments_read: u64,
    pub channels_read: u64,
    pub index_entries: u64,
    pub records_decoded: u64,
    pub records_unrecognized: u64,
    pub data_blocks_read: u64,
    pub crc_failures: u64,
    pub sections_decrypted: u64,
    pub failed_children: u64,
}

impl ReadCounters {
    /// One file read from disk.
    pub fn add_file(&mut self, len: usize) {
        self.files_read += 1;
        self.bytes_read += len as u64;
    }

    /// Outcome of one record.
    pub fn add_record(&mut self, recognized: bool) {
        if recognized {
            self.records_decoded += 1;
        } else {
            self.records_unrecognized += 1;
        }
    }

    pub fn records_total(&self) -> u64 {
        self.records_decoded + self.records_unrecognized
    }

    pub fn merge(&mut self, other: &ReadCounters) {
        self.files_read += other.files_read;
        self.bytes_read += other.bytes_read;
        self.segments_read += other.segments_read;
        self.channels_read += other.channels_read;
        self.index_entries += other.index_entries;
        self.records_decoded += other.records_decoded;
        self.records_unrecognized += other.records_unrecognized;
        self.data_blocks_read += other.data_blocks_read;
        self.crc_failures += other.crc_failures;
        self.sections_decrypted += other.sections_decrypted;
        self.failed_children += other.failed_children;
    }
}

impl AddAssign for ReadCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
