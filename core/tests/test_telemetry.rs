#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mef3_core::telemetry::*;

    #[test]
    fn counters_merge_field_by_field() {
        let mut a = ReadCounters::default();
        a.add_file(100);
        a.add_record(true);
        a.crc_failures = 1;

        let mut b = ReadCounters::default();
        b.add_file(50);
        b.add_record(false);
        b.failed_children = 2;

        a += b;
        assert_eq!(a.files_read, 2);
        assert_eq!(a.bytes_read, 150);
        assert_eq!(a.records_total(), 2);
        assert_eq!(a.records_unrecognized, 1);
        assert_eq!(a.crc_failures, 1);
        assert_eq!(a.failed_children, 2);
    }

    #[test]
    fn stage_times_accumulate_and_merge() {
        let mut t = StageTimes::default();
        t.add(Stage::ReadIndex, Duration::from_millis(2));
        t.add(Stage::ReadIndex, Duration::from_millis(3));

        let mut other = StageTimes::default();
        other.add(Stage::Decrypt, Duration::from_micros(250));
        t.merge(&other);

        assert_eq!(t.get(Stage::ReadIndex), Duration::from_millis(5));
        assert!((t.get_ms(Stage::ReadIndex) - 5.0).abs() < 1e-9);
        assert!((t.get_ms(Stage::Decrypt) - 0.25).abs() < 1e-9);
        assert_eq!(t.get(Stage::Open), Duration::ZERO);
        assert_eq!(t.total(), Duration::from_micros(5250));
        assert_eq!(t.iter().count(), 2);
    }

    #[test]
    fn timer_snapshot_carries_stage_times() {
        let mut timer = ReadTimer::new();
        timer.stage_times.add(Stage::ReadMetadata, Duration::from_millis(2));
        std::thread::sleep(Duration::from_millis(2));
        timer.finish();
        assert!(timer.elapsed() >= timer.stage_times.total());

        let mut counters = ReadCounters::default();
        counters.add_file(4096);
        let snap = ReadTelemetry::from(&counters, &timer);
        assert!(snap.has_all_stages(&[Stage::ReadMetadata]));
        assert!(!snap.has_all_stages(&[Stage::ReadMetadata, Stage::ReadData]));
        assert!(snap.throughput_bytes_per_sec > 0.0);
        assert_eq!(snap.total_stage_time(), snap.stage_times.total());
    }

    #[test]
    fn stages_display_in_snake_case() {
        assert_eq!(Stage::ReadUniversalHeader.to_string(), "read_universal_header");
        assert_eq!(Stage::Decrypt.to_string(), "decrypt");
    }

    #[test]
    fn snapshot_serializes() {
        let mut timer = ReadTimer::new();
        timer.stage_times.add(Stage::ReadRecords, Duration::from_millis(1));
        timer.finish();
        let snap = ReadTelemetry::from(&ReadCounters::default(), &timer);

        let json = serde_json::to_string(&snap).unwrap();
        let back: ReadTelemetry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stage_times, snap.stage_times);
        assert_eq!(back.counters, snap.counters);
    }
}
