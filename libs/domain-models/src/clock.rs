// [libs/domain-models/src/clock.rs]
//! Monotonic-clock anchor shared by the license store and the admission
//! middleware's staleness check. `system_up_time` in the license record is
//! a millisecond offset against this process-lifetime `Instant`, never a
//! wall-clock value — it must not move backward if the OS clock is stepped.

use std::sync::OnceLock;
use std::time::Instant;

static PROCESS_EPOCH: OnceLock<Instant> = OnceLock::new();

fn process_epoch() -> Instant {
    *PROCESS_EPOCH.get_or_init(Instant::now)
}

/// Milliseconds elapsed since this process's monotonic epoch.
pub fn monotonic_now_ms() -> i64 {
    process_epoch().elapsed().as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let first = monotonic_now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = monotonic_now_ms();
        assert!(second >= first);
    }
}
