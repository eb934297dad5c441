use std::time::Duration;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that machine-id distribution can emit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Every slot in the `2^machine_bits` space is held by another live
    /// identity. Raised synchronously at `distribute` time; the operator
    /// must free stale leases or widen the machine field (a breaking,
    /// versioned change to the ID format).
    #[error("machine id space exhausted: namespace={namespace}, machine_bits={machine_bits}")]
    MachineIdOverflow {
        namespace: String,
        machine_bits: u32,
    },

    /// The backing registry could not be reached or answered with a
    /// transport-level failure. Retryable with backoff; generators that
    /// already hold a machine id are unaffected.
    #[error("machine id registry unavailable: {reason}")]
    Registry { reason: String },

    /// A caller-supplied deadline elapsed before distribution completed.
    /// No lease was created.
    #[error("machine id distribution timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// An error bubbled up from the core ID crate.
    #[error(transparent)]
    Core(#[from] nivis::Error),
}
