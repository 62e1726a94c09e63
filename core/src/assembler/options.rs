//! assembler/options.rs
//! Per-request read options.
//!
//! Every read takes its own `ReadOptions`; nothing is process-wide, so
//! concurrent reads with different policies cannot interfere.

use serde::{Deserialize, Serialize};

use crate::types::MefError;

/// What a failed child (segment or channel) does to the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorOnFail {
    /// First child failure aborts the read; nothing partial is returned.
    ExitOnFail,
    /// Failed children are left out and reported as diagnostics.
    #[default]
    SuppressAndReturnPartial,
}

/// How CRC mismatches are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrcPolicy {
    /// File CRC failures fail the file; record CRC failures keep the record
    /// as `Unrecognized` with a diagnostic.
    #[default]
    Validate,
    /// No CRC is computed.
    Ignore,
    /// Any CRC failure, record CRCs included, fails the enclosing file.
    Strict,
}

impl CrcPolicy {
    pub fn checks(self) -> bool {
        self != CrcPolicy::Ignore
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Level 1 or level 2 password; `None` reads unencrypted data only.
    pub password: Option<String>,

    /// Read raw RED blocks of every time-series segment.
    pub read_time_series_data: bool,

    /// Decode record files at every level.
    pub read_record_data: bool,

    /// Keep index entries in the tree (metadata-only tooling can skip them).
    pub read_indices: bool,

    pub behavior_on_fail: BehaviorOnFail,

    pub crc_policy: CrcPolicy,

    /// Assemble sibling channels on worker threads.
    pub parallel_channels: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            password: None,
            read_time_series_data: false,
            read_record_data: true,
            read_indices: true,
            behavior_on_fail: BehaviorOnFail::default(),
            crc_policy: CrcPolicy::default(),
            parallel_channels: false,
        }
    }
}

impl ReadOptions {
    pub fn new(
        password: Option<&str>,
        read_time_series_data: bool,
        read_record_data: bool,
        behavior_on_fail: BehaviorOnFail,
    ) -> Self {
        Self {
            password: password.map(str::to_owned),
            read_time_series_data,
            read_record_data,
            behavior_on_fail,
            ..Self::default()
        }
    }

    /// Parse options from JSON; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, MefError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, MefError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_owned());
        self
    }

    pub fn with_time_series_data(mut self, on: bool) -> Self {
        self.read_time_series_data = on;
        self
    }

    pub fn with_record_data(mut self, on: bool) -> Self {
        self.read_record_data = on;
        self
    }

    pub fn with_indices(mut self, on: bool) -> Self {
        self.read_indices = on;
        self
    }

    pub fn with_behavior_on_fail(mut self, behavior: BehaviorOnFail) -> Self {
        self.behavior_on_fail = behavior;
        self
    }

    pub fn with_crc_policy(mut self, policy: CrcPolicy) -> Self {
        self.crc_policy = policy;
        self
    }

    pub fn with_parallel_channels(mut self, on: bool) -> Self {
        self.parallel_channels = on;
        self
    }

    pub fn exits_on_fail(&self) -> bool {
        self.behavior_on_fail == BehaviorOnFail::ExitOnFail
    }
}
