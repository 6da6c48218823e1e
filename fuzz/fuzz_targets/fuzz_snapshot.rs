#![no_main]
use classic_monitor::snapshot::parse_snapshot;
use classic_monitor::{Registry, SnapshotEvaluator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(snapshot) = parse_snapshot(&text, chrono_tz::Tz::UTC) {
        if let Ok(registry) = Registry::builtin() {
            let report = SnapshotEvaluator::new(registry).evaluate(&snapshot);
            assert_eq!(report.len(), report.data.iter().count());
        }
    }
});
