use std::time::Duration;

/// Sleep before retry number `retry` (0 is the first retry): `base * 2^retry`,
/// saturating instead of overflowing.
pub fn retry_delay(retry: u32, base: Duration) -> Duration { base.saturating_mul(2_u32.saturating_pow(retry)) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FetchOptions;

    #[test]
    fn default_policy_waits_250_500_1000() {
        let options = FetchOptions::default();
        let waits: Vec<u128> = (0..options.max_retries)
            .map(|n| retry_delay(n, options.retry_backoff).as_millis())
            .collect();
        assert_eq!(waits, [250u128, 500, 1000]);
    }

    #[test]
    fn worst_case_wait_for_default_policy() {
        let options = FetchOptions::default();
        let total: Duration = (0..options.max_retries)
            .map(|n| retry_delay(n, options.retry_backoff))
            .sum();
        assert_eq!(total, Duration::from_millis(1750));
    }

    #[test]
    fn huge_retry_counts_saturate() {
        assert_eq!(retry_delay(64, Duration::from_secs(u64::MAX)), Duration::MAX);
        assert_eq!(retry_delay(64, Duration::ZERO), Duration::ZERO);
    }
}
