use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch: Tuesday, December 24, 2019 16:00:00 UTC, in milliseconds.
pub const DEFAULT_EPOCH_MILLIS: u64 = 1_577_203_200_000;

/// Default epoch: Tuesday, December 24, 2019 16:00:00 UTC, in seconds.
pub const DEFAULT_EPOCH_SECONDS: u64 = 1_577_203_200;

/// A source of absolute time, in ticks since the Unix epoch.
///
/// The tick unit must match the resolution of the [`BitLayout`] the
/// generator was configured with (milliseconds for [`BitLayout::millis`],
/// seconds for [`BitLayout::seconds`]).
///
/// The clock is an injectable dependency: tests substitute deterministic
/// sources, and a drift-correcting strategy (smoothing small regressions
/// before they reach the generator's clock-backwards check) can be layered
/// over [`SystemClock`] without changing the generation algorithm.
///
/// # Example
///
/// ```
/// use nivis::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_ticks(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_ticks(), 1234);
/// ```
///
/// [`BitLayout`]: crate::BitLayout
/// [`BitLayout::millis`]: crate::BitLayout::millis
/// [`BitLayout::seconds`]: crate::BitLayout::seconds
pub trait TimeSource {
    /// Returns the current time in ticks since the Unix epoch.
    fn current_ticks(&self) -> u64;
}

impl<T: TimeSource> TimeSource for &T {
    fn current_ticks(&self) -> u64 {
        (**self).current_ticks()
    }
}

/// Tick resolution of a [`SystemClock`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Resolution {
    Millis,
    Seconds,
}

/// Wall-clock [`TimeSource`] backed by [`SystemTime`].
///
/// Deliberately *not* smoothed or made monotonic: a regression of the
/// system clock must be observable so the generator can report it as a
/// failure instead of silently emitting IDs from the past.
#[derive(Copy, Clone, Debug)]
pub struct SystemClock {
    resolution: Resolution,
}

impl SystemClock {
    /// A clock ticking in milliseconds.
    pub const fn millis() -> Self {
        Self {
            resolution: Resolution::Millis,
        }
    }

    /// A clock ticking in seconds.
    pub const fn seconds() -> Self {
        Self {
            resolution: Resolution::Seconds,
        }
    }
}

impl TimeSource for SystemClock {
    fn current_ticks(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH");
        match self.resolution {
            Resolution::Millis => now.as_millis() as u64,
            Resolution::Seconds => now.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_the_default_epoch() {
        assert!(SystemClock::millis().current_ticks() > DEFAULT_EPOCH_MILLIS);
        assert!(SystemClock::seconds().current_ticks() > DEFAULT_EPOCH_SECONDS);
    }

    #[test]
    fn resolutions_are_three_orders_of_magnitude_apart() {
        let millis = SystemClock::millis().current_ticks();
        let seconds = SystemClock::seconds().current_ticks();
        // a second boundary may tick between the two reads
        assert!((millis / 1000).abs_diff(seconds) <= 1);
    }
}
