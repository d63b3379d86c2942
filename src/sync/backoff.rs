use std::time::Duration;

/// Capped exponential backoff for feeds that keep hitting network errors.
///
/// The poll interval is the base step: after `n` consecutive network
/// failures the next attempt waits `interval * 2^(n-1)`, never more than the
/// cap.  The first failure therefore costs nothing beyond the normal cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    cap: Duration,
}

impl Backoff {
    pub fn capped_at(cap: Duration) -> Self {
        Self { cap }
    }

    /// Minimum time between the start of the failed attempt and the next one.
    pub fn delay(&self, interval: Duration, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32
            .checked_shl(consecutive_failures - 1)
            .unwrap_or(u32::MAX);
        interval.saturating_mul(factor).min(self.cap.max(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn doubles_until_cap() {
        let b = Backoff::capped_at(Duration::from_secs(30));
        assert_eq!(b.delay(SEC, 0), Duration::ZERO);
        assert_eq!(b.delay(SEC, 1), SEC);
        assert_eq!(b.delay(SEC, 2), 2 * SEC);
        assert_eq!(b.delay(SEC, 3), 4 * SEC);
        assert_eq!(b.delay(SEC, 5), 16 * SEC);
        assert_eq!(b.delay(SEC, 6), 30 * SEC);
        assert_eq!(b.delay(SEC, 200), 30 * SEC);
    }

    #[test]
    fn cap_below_interval_never_speeds_up_polling() {
        let b = Backoff::capped_at(Duration::from_millis(10));
        assert_eq!(b.delay(SEC, 4), SEC);
    }
}
