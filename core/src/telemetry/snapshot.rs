//! telemetry/snapshot.rs
//! Immutable read telemetry attached to a returned `Session`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::ReadCounters;
use crate::telemetry::timers::{ReadTimer, Stage, StageTimes};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadTelemetry {
    pub counters: ReadCounters,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl ReadTelemetry {
    pub fn from(counters: &ReadCounters, timer: &ReadTimer) -> Self {
        let elapsed = timer.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_read as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        Self {
            counters: counters.clone(),
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        expected.iter().all(|s| self.stage_times.get(*s) > Duration::ZERO)
    }
}
