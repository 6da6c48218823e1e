#![no_main]
use classic_monitor::RegisterSnapshot;
use classic_monitor::expr::Formula;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Whatever parses must also evaluate without panicking
    if let Ok(formula) = Formula::parse(source) {
        let regs = formula
            .registers()
            .into_iter()
            .enumerate()
            .map(|(i, r)| (r, (i as u16).wrapping_mul(40503)));
        let snapshot = RegisterSnapshot::new(chrono::DateTime::UNIX_EPOCH, regs);
        let _ = formula.evaluate(&snapshot);
    }
});
