//! Machine-id distribution for [`nivis`] generators.
//!
//! Every generator in a deployment must own a distinct machine id or the
//! uniqueness guarantee collapses. This crate assigns those ids from a
//! namespace-scoped slot space of `2^machine_bits` slots:
//!
//! - [`InstanceId`]: a generator's identity (`host:port` plus a stability
//!   flag). Identity is the address, so a restarted instance recovers its
//!   prior machine id.
//! - [`MachineIdRegistry`]: the async storage contract. The bundled
//!   [`InMemoryRegistry`] serves tests and single-store deployments;
//!   distributed stores implement the same trait over their own atomic
//!   claim primitive.
//! - [`MachineIdDistributor`]: allocation policy — identity-sticky reuse,
//!   ascending first-fit claims, stability-aware revert, and lease expiry
//!   via a configurable safe guard.
//!
//! ```rust
//! use nivis_machine::{InMemoryRegistry, InstanceId, MachineIdDistributor};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> nivis_machine::Result<()> {
//! let distributor = MachineIdDistributor::new(InMemoryRegistry::new());
//! let instance = InstanceId::new("10.0.0.1", 8080, true);
//!
//! let guarded = distributor.distribute("order-service", 10, &instance).await?;
//! assert!(guarded.machine_id() < 1 << 10);
//! # Ok(())
//! # }
//! ```
//!
//! The allocated id then seeds a generator's `machine_id` field, e.g.
//! `LockSnowflakeGenerator::new(layout, guarded.machine_id(), clock)`.

mod distributor;
mod error;
mod instance;
mod registry;

pub use distributor::{GuardedMachineId, MachineIdDistributor};
pub use error::{Error, Result};
pub use instance::InstanceId;
pub use registry::{
    Expiry, FOREVER_SAFE_GUARD, InMemoryRegistry, MachineIdRegistry, MachineLease,
};
