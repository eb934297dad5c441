//! Error types for ID generation and decoding.
//!
//! Every failure mode is a distinct variant: a caller can always tell a
//! transient condition (clock regression) from a permanent one (timestamp
//! overflow) or a configuration mistake. No error is ever folded into a
//! wrong-but-plausible ID.

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `nivis` can emit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid bit widths or an out-of-range machine ID, detected at
    /// construction. Fatal to that construction call only.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// The local clock reported a timestamp earlier than the last one used
    /// for generation. Fails the current `generate()` call and leaves
    /// generator state untouched; the caller decides whether to retry (most
    /// causes are transient NTP corrections).
    #[error(
        "clock moved backwards: last_timestamp={last_timestamp}, current_timestamp={current_timestamp}"
    )]
    ClockBackwards {
        last_timestamp: u64,
        current_timestamp: u64,
    },

    /// The timestamp field's capacity is exhausted. Permanent and
    /// non-retryable: the deployment has outlived its epoch/bit-width
    /// budget.
    #[error("timestamp overflow: epoch={epoch}, diff={diff}, max_timestamp={max_timestamp}")]
    TimestampOverflow {
        epoch: u64,
        diff: u64,
        max_timestamp: u64,
    },

    /// A friendly-id string had the wrong length.
    #[error("friendly id must be exactly {expected} characters, got {actual}")]
    FriendlyIdLength { expected: usize, actual: usize },

    /// A friendly-id string contained a byte outside the Crockford base32
    /// alphabet.
    #[error("friendly id contains invalid byte {byte:#04x} at index {index}")]
    FriendlyIdByte { byte: u8, index: usize },

    /// A friendly-id string decoded to a value outside the layout's id
    /// space (high bits set beyond the configured total width).
    #[error("friendly id decodes outside the configured id space: {id:#018x}")]
    FriendlyIdOverflow { id: u64 },
}
