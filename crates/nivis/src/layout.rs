use crate::{Error, Result};
use crate::time::{DEFAULT_EPOCH_MILLIS, DEFAULT_EPOCH_SECONDS};

/// Upper bound on the sum of all field widths, keeping the sign bit of an
/// `i64` clear so raw IDs survive signed 64-bit consumers unchanged.
pub const TOTAL_BITS: u32 = 63;

/// Field-width budget for consumers whose native numeric type is an
/// IEEE-754 double (JavaScript): integers above `2^53 - 1` lose precision.
pub const JAVASCRIPT_SAFE_BITS: u32 = 53;

/// The bit-field layout of a Snowflake-style ID.
///
/// A layout fixes the epoch and the widths of the timestamp, machine-id and
/// sequence fields; everything else (masks, shifts, maxima) is derived.
/// Layouts are validated once at construction and immutable afterwards, so
/// they are freely copyable and safe to share across threads.
///
/// ```text
///  Bit Index:  62              s+m  s+m-1        s  s-1            0
///              +------------------+----------------+---------------+
///  Field:      |  timestamp (t)   |  machine (m)   |  sequence (s) |
///              +------------------+----------------+---------------+
/// ```
///
/// # Example
/// ```
/// use nivis::BitLayout;
///
/// let layout = BitLayout::millis();
/// assert_eq!(layout.timestamp_shift(), 22);
/// assert_eq!(layout.max_machine_id(), 1023);
/// assert_eq!(layout.max_sequence(), 4095);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitLayout {
    epoch: u64,
    timestamp_bits: u32,
    machine_bits: u32,
    sequence_bits: u32,
}

impl BitLayout {
    /// Builds a layout from an epoch (ticks since the Unix epoch, in the
    /// resolution of the clock this layout will be paired with) and three
    /// field widths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the widths sum to more than
    /// [`TOTAL_BITS`], or if the timestamp or sequence field is empty.
    pub fn new(epoch: u64, timestamp_bits: u32, machine_bits: u32, sequence_bits: u32) -> Result<Self> {
        let total = u64::from(timestamp_bits) + u64::from(machine_bits) + u64::from(sequence_bits);
        if total > u64::from(TOTAL_BITS) {
            return Err(Error::Config {
                reason: format!(
                    "total bit width {total} exceeds the {TOTAL_BITS}-bit budget \
                     (timestamp={timestamp_bits}, machine={machine_bits}, sequence={sequence_bits})"
                ),
            });
        }
        if timestamp_bits == 0 || sequence_bits == 0 {
            return Err(Error::Config {
                reason: format!(
                    "timestamp and sequence fields must be non-empty \
                     (timestamp={timestamp_bits}, sequence={sequence_bits})"
                ),
            });
        }
        Ok(Self {
            epoch,
            timestamp_bits,
            machine_bits,
            sequence_bits,
        })
    }

    /// The reference millisecond layout: 41 timestamp bits, 10 machine
    /// bits, 12 sequence bits against [`DEFAULT_EPOCH_MILLIS`].
    ///
    /// 41 bits of milliseconds exhaust roughly 69.7 years after the epoch.
    pub const fn millis() -> Self {
        Self {
            epoch: DEFAULT_EPOCH_MILLIS,
            timestamp_bits: 41,
            machine_bits: 10,
            sequence_bits: 12,
        }
    }

    /// Second-resolution layout: 31 timestamp bits, 10 machine bits, 22
    /// sequence bits against [`DEFAULT_EPOCH_SECONDS`].
    ///
    /// Same algorithm, coarser unit: the wider sequence field absorbs the
    /// lower tick rate.
    pub const fn seconds() -> Self {
        Self {
            epoch: DEFAULT_EPOCH_SECONDS,
            timestamp_bits: 31,
            machine_bits: 10,
            sequence_bits: 22,
        }
    }

    /// Millisecond layout narrowed to 53 total bits (41/3/9) so every
    /// reachable ID is exactly representable in an IEEE-754 double.
    pub const fn javascript_safe() -> Self {
        Self {
            epoch: DEFAULT_EPOCH_MILLIS,
            timestamp_bits: 41,
            machine_bits: 3,
            sequence_bits: 9,
        }
    }

    /// The epoch, in ticks since the Unix epoch.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub const fn timestamp_bits(&self) -> u32 {
        self.timestamp_bits
    }

    pub const fn machine_bits(&self) -> u32 {
        self.machine_bits
    }

    pub const fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    /// Sum of the three field widths.
    pub const fn total_bits(&self) -> u32 {
        self.timestamp_bits + self.machine_bits + self.sequence_bits
    }

    /// Whether every reachable ID fits in `2^53 - 1`, i.e. survives
    /// consumers whose native numeric type is a double.
    pub const fn is_javascript_safe(&self) -> bool {
        self.total_bits() <= JAVASCRIPT_SAFE_BITS
    }

    /// Largest epoch-relative timestamp the layout can encode.
    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits)
    }

    /// Largest machine ID the layout can encode.
    pub const fn max_machine_id(&self) -> u64 {
        mask(self.machine_bits)
    }

    /// Largest intra-tick sequence value the layout can encode.
    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    /// Left shift applied to the machine-id field.
    pub const fn machine_shift(&self) -> u32 {
        self.sequence_bits
    }

    /// Left shift applied to the timestamp field.
    pub const fn timestamp_shift(&self) -> u32 {
        self.sequence_bits + self.machine_bits
    }

    /// Mask covering every bit of the packed ID.
    pub const fn id_mask(&self) -> u64 {
        mask(self.total_bits())
    }

    /// Validates a machine ID against this layout's machine field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `machine_id` exceeds
    /// [`Self::max_machine_id`].
    pub fn check_machine_id(&self, machine_id: u64) -> Result<()> {
        if machine_id > self.max_machine_id() {
            return Err(Error::Config {
                reason: format!(
                    "machine id {machine_id} exceeds max {} for a {}-bit machine field",
                    self.max_machine_id(),
                    self.machine_bits
                ),
            });
        }
        Ok(())
    }

    /// Packs an epoch-relative timestamp, machine ID and sequence into a
    /// raw ID. Components are assumed in range; the generator and codec
    /// enforce that before calling.
    pub const fn compose(&self, timestamp: u64, machine_id: u64, sequence: u64) -> u64 {
        (timestamp << self.timestamp_shift()) | (machine_id << self.machine_shift()) | sequence
    }

    /// Extracts the epoch-relative timestamp from a packed ID.
    pub const fn timestamp_of(&self, id: u64) -> u64 {
        (id >> self.timestamp_shift()) & self.max_timestamp()
    }

    /// Extracts the machine ID from a packed ID.
    pub const fn machine_id_of(&self, id: u64) -> u64 {
        (id >> self.machine_shift()) & self.max_machine_id()
    }

    /// Extracts the sequence from a packed ID.
    pub const fn sequence_of(&self, id: u64) -> u64 {
        id & self.max_sequence()
    }
}

const fn mask(bits: u32) -> u64 {
    if bits == 0 { 0 } else { (1 << bits) - 1 }
}
