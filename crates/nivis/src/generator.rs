use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{BitLayout, Error, Result, TimeSource};

/// The shared generation contract: something that produces raw IDs.
///
/// Wrappers that add behavior (friendly-string rendering, clock
/// correction, prefixing) compose over this trait rather than subclassing
/// a generator; each wrapper stays independently testable.
pub trait IdGenerator {
    /// Produces the next raw ID.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockBackwards`] if the clock regressed below the last
    ///   generation timestamp (retryable; state is unchanged).
    /// - [`Error::TimestampOverflow`] if the timestamp field is exhausted
    ///   (permanent).
    fn generate(&self) -> Result<u64>;
}

/// Mutable generation state: the last timestamp used (absolute ticks,
/// monotonically non-decreasing) and the intra-tick sequence.
#[derive(Copy, Clone, Debug)]
struct GenState {
    last_timestamp: u64,
    sequence: u64,
}

impl GenState {
    const fn initial() -> Self {
        Self {
            last_timestamp: 0,
            sequence: 0,
        }
    }
}

/// Immutable generation parameters shared by both generator flavors.
#[derive(Clone)]
struct SnowflakeCore<T> {
    layout: BitLayout,
    machine_id: u64,
    sequence_reset_threshold: u64,
    time: T,
}

impl<T: TimeSource> SnowflakeCore<T> {
    fn new(layout: BitLayout, machine_id: u64, time: T) -> Result<Self> {
        layout.check_machine_id(machine_id)?;
        Ok(Self {
            layout,
            machine_id,
            // half the sequence space: keeps low-order bits close to
            // uniformly distributed when ids are reduced modulo N for
            // sharding, without resetting on every tick
            sequence_reset_threshold: layout.max_sequence() >> 1,
            time,
        })
    }

    /// Runs one full generation step against `state`.
    ///
    /// On error, `state` is left exactly as it was.
    fn next(&self, state: &mut GenState) -> Result<u64> {
        let mut now = self.time.current_ticks();
        if now < state.last_timestamp {
            return Err(Error::ClockBackwards {
                last_timestamp: state.last_timestamp,
                current_timestamp: now,
            });
        }

        let mut sequence = state.sequence;
        if now > state.last_timestamp && sequence >= self.sequence_reset_threshold {
            sequence = 0;
        }

        sequence = (sequence + 1) & self.layout.max_sequence();
        if sequence == 0 {
            // sequence space for this tick is exhausted: spin until the
            // clock advances strictly past the last used timestamp
            now = self.next_tick(state.last_timestamp);
        }

        let diff = now
            .checked_sub(self.layout.epoch())
            .ok_or_else(|| Error::Config {
                reason: format!(
                    "clock {now} is before the configured epoch {}",
                    self.layout.epoch()
                ),
            })?;
        if diff > self.layout.max_timestamp() {
            return Err(Error::TimestampOverflow {
                epoch: self.layout.epoch(),
                diff,
                max_timestamp: self.layout.max_timestamp(),
            });
        }

        state.last_timestamp = now;
        state.sequence = sequence;
        Ok(self.layout.compose(diff, self.machine_id, sequence))
    }

    /// Busy-polls the clock until it moves strictly past `last`.
    ///
    /// Bounded by the tick unit: with millisecond resolution this returns
    /// within a few milliseconds at most.
    #[cold]
    fn next_tick(&self, last: u64) -> u64 {
        let mut now = self.time.current_ticks();
        while now <= last {
            core::hint::spin_loop();
            now = self.time.current_ticks();
        }
        now
    }
}

/// A single-threaded Snowflake generator.
///
/// The fastest flavor: state lives in a [`core::cell::Cell`], so the type
/// is not [`Sync`] and cannot be shared across threads. For shared use,
/// see [`LockSnowflakeGenerator`].
///
/// # Example
/// ```
/// use nivis::{BasicSnowflakeGenerator, BitLayout, IdGenerator, SystemClock};
///
/// let generator =
///     BasicSnowflakeGenerator::new(BitLayout::millis(), 7, SystemClock::millis()).unwrap();
/// let first = generator.generate().unwrap();
/// let second = generator.generate().unwrap();
/// assert!(second > first);
/// ```
pub struct BasicSnowflakeGenerator<T> {
    core: SnowflakeCore<T>,
    state: core::cell::Cell<GenState>,
}

impl<T: TimeSource> BasicSnowflakeGenerator<T> {
    /// Creates a generator for `machine_id` under `layout`, reading time
    /// from `time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `machine_id` exceeds the layout's
    /// machine field.
    pub fn new(layout: BitLayout, machine_id: u64, time: T) -> Result<Self> {
        Ok(Self {
            core: SnowflakeCore::new(layout, machine_id, time)?,
            state: core::cell::Cell::new(GenState::initial()),
        })
    }

    /// Overrides the sequence-reset threshold (defaults to half the
    /// sequence space).
    #[must_use]
    pub fn with_sequence_reset_threshold(mut self, threshold: u64) -> Self {
        self.core.sequence_reset_threshold = threshold;
        self
    }

    /// The layout this generator packs IDs with.
    pub const fn layout(&self) -> &BitLayout {
        &self.core.layout
    }

    /// The machine ID encoded into every produced ID.
    pub const fn machine_id(&self) -> u64 {
        self.core.machine_id
    }

    /// Last timestamp (absolute ticks) used to produce an ID.
    pub fn last_timestamp(&self) -> u64 {
        self.state.get().last_timestamp
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> Result<u64> {
        let mut state = self.state.get();
        let id = self.core.next(&mut state)?;
        self.state.set(state);
        Ok(id)
    }
}

impl<T: TimeSource> IdGenerator for BasicSnowflakeGenerator<T> {
    fn generate(&self) -> Result<u64> {
        self.generate()
    }
}

/// A thread-safe Snowflake generator.
///
/// State sits behind an [`Arc`]`<`[`Mutex`]`<_>>`, so clones share one
/// logical generator and the full generation step runs serialized:
/// concurrent callers observe a strict total order of returned IDs with no
/// duplicates.
///
/// # Example
/// ```
/// use nivis::{BitLayout, IdGenerator, LockSnowflakeGenerator, SystemClock};
///
/// let generator =
///     LockSnowflakeGenerator::new(BitLayout::millis(), 7, SystemClock::millis()).unwrap();
/// let worker = generator.clone();
/// let id = std::thread::spawn(move || worker.generate().unwrap())
///     .join()
///     .unwrap();
/// assert!(generator.generate().unwrap() > id);
/// ```
pub struct LockSnowflakeGenerator<T> {
    core: SnowflakeCore<T>,
    state: Arc<Mutex<GenState>>,
}

impl<T: Clone> Clone for LockSnowflakeGenerator<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: TimeSource> LockSnowflakeGenerator<T> {
    /// Creates a shared generator for `machine_id` under `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `machine_id` exceeds the layout's
    /// machine field.
    pub fn new(layout: BitLayout, machine_id: u64, time: T) -> Result<Self> {
        Ok(Self {
            core: SnowflakeCore::new(layout, machine_id, time)?,
            state: Arc::new(Mutex::new(GenState::initial())),
        })
    }

    /// Overrides the sequence-reset threshold (defaults to half the
    /// sequence space).
    #[must_use]
    pub fn with_sequence_reset_threshold(mut self, threshold: u64) -> Self {
        self.core.sequence_reset_threshold = threshold;
        self
    }

    /// The layout this generator packs IDs with.
    pub const fn layout(&self) -> &BitLayout {
        &self.core.layout
    }

    /// The machine ID encoded into every produced ID.
    pub const fn machine_id(&self) -> u64 {
        self.core.machine_id
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> Result<u64> {
        let mut state = self.state.lock();
        self.core.next(&mut state)
    }
}

impl<T: TimeSource> IdGenerator for LockSnowflakeGenerator<T> {
    fn generate(&self) -> Result<u64> {
        self.generate()
    }
}
