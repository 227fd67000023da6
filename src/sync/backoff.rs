//! Exponential backoff with jitter for queue retries.

use std::time::Duration;

use rand::Rng;

/// Delay before retry number `attempt` (1-based), doubling from `base_ms`
/// up to `max_ms`, with 0-10% jitter on top.
pub fn retry_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(exponential).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_and_caps() {
        let d1 = retry_delay(1, 100, 2000);
        assert!(d1.as_millis() >= 100);

        let d2 = retry_delay(2, 100, 2000);
        assert!(d2.as_millis() >= 200);

        let capped = retry_delay(12, 100, 1000);
        assert!(capped.as_millis() >= 1000);
        assert!(capped.as_millis() <= 1100);
    }

    #[test]
    fn test_zero_attempt_is_immediate() {
        assert_eq!(retry_delay(0, 100, 2000), Duration::ZERO);
    }
}
