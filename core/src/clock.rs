//! Conversion of real elapsed time into discrete simulation ticks.

use std::time::Duration;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Accumulates real time and releases whole ticks at a fixed rate.
///
/// The remainder is stored in units of `nanoseconds * ticks_per_second`, so
/// no fractional time is ever lost between frames regardless of how the
/// elapsed time is sliced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickClock {
    ticks_per_second: u32,
    carry: u128,
}

impl TickClock {
    /// Creates a clock releasing `ticks_per_second` ticks per simulated second.
    ///
    /// A rate of zero is clamped to one tick per second.
    #[must_use]
    pub const fn new(ticks_per_second: u32) -> Self {
        let ticks_per_second = if ticks_per_second == 0 {
            1
        } else {
            ticks_per_second
        };
        Self {
            ticks_per_second,
            carry: 0,
        }
    }

    /// Number of ticks released per simulated second.
    #[must_use]
    pub const fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    /// Adds elapsed time and returns the number of whole ticks it completed.
    pub fn advance(&mut self, dt: Duration) -> u64 {
        let scaled = dt.as_nanos() * u128::from(self.ticks_per_second);
        let total = self.carry + scaled;
        self.carry = total % NANOS_PER_SECOND;
        u64::try_from(total / NANOS_PER_SECOND).unwrap_or(u64::MAX)
    }

    /// Fraction of the next tick that has already accumulated, in `0.0..1.0`.
    #[must_use]
    pub fn pending_fraction(&self) -> f32 {
        self.carry as f32 / NANOS_PER_SECOND as f32
    }

    /// Discards any partially accumulated tick.
    pub fn reset(&mut self) {
        self.carry = 0;
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_second_releases_full_rate() {
        let mut clock = TickClock::new(60);

        assert_eq!(clock.advance(Duration::from_secs(1)), 60);
        assert_eq!(clock.pending_fraction(), 0.0);
    }

    #[test]
    fn fractional_time_is_carried_between_frames() {
        let mut clock = TickClock::new(60);
        let frame = Duration::from_millis(10);

        let released: u64 = (0..100).map(|_| clock.advance(frame)).sum();

        assert_eq!(released, 60);
    }

    #[test]
    fn uneven_frames_never_drift() {
        let mut clock = TickClock::new(30);
        let frames = [7u64, 13, 29, 3, 48, 900];
        let mut released = 0;
        let mut elapsed = 0;

        for _ in 0..50 {
            for millis in frames {
                released += clock.advance(Duration::from_millis(millis));
                elapsed += millis;
            }
        }

        assert_eq!(released, elapsed * 30 / 1000);
    }

    #[test]
    fn zero_rate_is_clamped() {
        let mut clock = TickClock::new(0);

        assert_eq!(clock.ticks_per_second(), 1);
        assert_eq!(clock.advance(Duration::from_millis(2500)), 2);
    }
}
