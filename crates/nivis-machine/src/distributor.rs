use std::time::Duration;

use tracing::{debug, warn};

use crate::registry::{Expiry, MachineIdRegistry};
use crate::{Error, InstanceId, Result};

/// A machine id handed out by a [`MachineIdDistributor`], together with
/// the slot space it was drawn from.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuardedMachineId {
    machine_id: u64,
    machine_bits: u32,
    namespace: String,
}

impl GuardedMachineId {
    /// The allocated machine id, in `0..2^machine_bits`.
    pub const fn machine_id(&self) -> u64 {
        self.machine_id
    }

    pub const fn machine_bits(&self) -> u32 {
        self.machine_bits
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Allocates machine ids from a namespace-scoped slot space of
/// `2^machine_bits` slots, on top of any [`MachineIdRegistry`].
///
/// Allocation is identity-sticky: an instance that already holds a live
/// lease gets the same slot back (with a refreshed expiry) rather than a
/// new one. Fresh allocations scan ascending and take the first claimable
/// slot; when two instances race for it, the registry's atomic claim
/// decides and the loser moves on to the next slot.
pub struct MachineIdDistributor<R> {
    registry: R,
    safe_guard: Duration,
}

impl<R: MachineIdRegistry> MachineIdDistributor<R> {
    /// Creates a distributor whose leases never expire by time
    /// ([`FOREVER_SAFE_GUARD`](crate::FOREVER_SAFE_GUARD)).
    pub fn new(registry: R) -> Self {
        Self::with_safe_guard(registry, crate::FOREVER_SAFE_GUARD)
    }

    /// Creates a distributor whose leases expire `safe_guard` after the
    /// last successful `distribute` for the holding instance.
    pub fn with_safe_guard(registry: R, safe_guard: Duration) -> Self {
        Self {
            registry,
            safe_guard,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The size of the slot space for a given machine field width.
    pub const fn total_machine_ids(machine_bits: u32) -> u64 {
        1u64 << machine_bits
    }

    /// Allocates a machine id for `instance` within `namespace`.
    ///
    /// Returns [`Error::MachineIdOverflow`] once every slot is held by
    /// another live identity. Calling again for an instance that already
    /// holds a slot refreshes the lease and returns the same id.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn distribute(
        &self,
        namespace: &str,
        machine_bits: u32,
        instance: &InstanceId,
    ) -> Result<GuardedMachineId> {
        let expiry = Expiry::after(self.safe_guard);

        // Sticky path: an instance that held a slot before gets it back,
        // re-claiming to refresh the expiry.
        if let Some(slot) = self
            .registry
            .find_held(namespace, machine_bits, instance)
            .await?
        {
            if self
                .registry
                .try_claim(namespace, machine_bits, slot, instance, expiry)
                .await?
            {
                debug!(%instance, namespace, slot, "machine id reclaimed");
                return Ok(self.guarded(namespace, machine_bits, slot));
            }
        }

        // First-fit scan from slot zero. A losing race on one slot is not
        // an error: the winner took it, so try the next.
        for slot in 0..Self::total_machine_ids(machine_bits) {
            if self
                .registry
                .try_claim(namespace, machine_bits, slot, instance, expiry)
                .await?
            {
                debug!(%instance, namespace, slot, "machine id distributed");
                return Ok(self.guarded(namespace, machine_bits, slot));
            }
        }

        warn!(%instance, namespace, machine_bits, "machine id space exhausted");
        Err(Error::MachineIdOverflow {
            namespace: namespace.to_owned(),
            machine_bits,
        })
    }

    /// [`distribute`](Self::distribute) bounded by a caller deadline.
    ///
    /// A slow or unreachable registry surfaces as [`Error::Timeout`]; no
    /// lease is observable from a timed-out call's winner path because
    /// the future is dropped before it can complete a claim round-trip.
    pub async fn distribute_with_timeout(
        &self,
        namespace: &str,
        machine_bits: u32,
        instance: &InstanceId,
        deadline: Duration,
    ) -> Result<GuardedMachineId> {
        match tokio::time::timeout(deadline, self.distribute(namespace, machine_bits, instance))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout { elapsed: deadline }),
        }
    }

    /// Returns `instance`'s lease to the pool on graceful shutdown.
    ///
    /// Stability-aware: a stable instance keeps its lease so a restart
    /// under the same address recovers the same machine id, and only
    /// expiry or [`evict`](Self::evict) frees the slot. Returns `true`
    /// if a lease was actually released.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn revert(&self, namespace: &str, instance: &InstanceId) -> Result<bool> {
        if instance.is_stable() {
            debug!(%instance, namespace, "revert skipped for stable instance");
            return Ok(false);
        }
        self.registry.release(namespace, instance).await
    }

    /// Administrative override: releases `instance`'s lease regardless of
    /// its stability flag. For operators reclaiming slots from
    /// decommissioned hosts.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn evict(&self, namespace: &str, instance: &InstanceId) -> Result<bool> {
        let released = self.registry.release(namespace, instance).await?;
        if released {
            warn!(%instance, namespace, "machine id evicted");
        }
        Ok(released)
    }

    fn guarded(&self, namespace: &str, machine_bits: u32, machine_id: u64) -> GuardedMachineId {
        GuardedMachineId {
            machine_id,
            machine_bits,
            namespace: namespace.to_owned(),
        }
    }
}
