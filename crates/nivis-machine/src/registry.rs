use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{InstanceId, Result};

/// Lease time-to-live sentinel: the lease never expires by time. Only an
/// explicit `revert` (for unstable instances) or administrative eviction
/// clears it.
pub const FOREVER_SAFE_GUARD: Duration = Duration::MAX;

/// When a lease stops protecting its slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// The [`FOREVER_SAFE_GUARD`] sentinel: no time-based expiry.
    Never,
    /// Expires once the deadline passes.
    At(Instant),
}

impl Expiry {
    /// Computes an expiry `safe_guard` from now. [`FOREVER_SAFE_GUARD`]
    /// maps to [`Expiry::Never`], as does any duration too large for the
    /// clock to represent a deadline for.
    pub fn after(safe_guard: Duration) -> Self {
        match Instant::now().checked_add(safe_guard) {
            Some(deadline) if safe_guard != FOREVER_SAFE_GUARD => Self::At(deadline),
            _ => Self::Never,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        match self {
            Self::Never => false,
            Self::At(deadline) => *deadline <= now,
        }
    }
}

/// One held machine-id slot: who holds it and until when.
#[derive(Clone, Debug)]
pub struct MachineLease {
    pub instance: InstanceId,
    pub expires_at: Expiry,
}

impl MachineLease {
    fn is_live(&self, now: Instant) -> bool {
        !self.expires_at.is_expired(now)
    }
}

/// The minimum contract a backing store must offer for machine-id
/// distribution.
///
/// The registry is an external collaborator: implementations layer these
/// operations over whatever atomic compare-and-set primitive their store
/// exposes (Redis, ZooKeeper, etcd, a relational row lock). The
/// distributor only supplies allocation *policy* on top.
///
/// Slot spaces are keyed by `(namespace, machine_bits)` and hold
/// `2^machine_bits` slots numbered from zero.
#[allow(async_fn_in_trait)]
pub trait MachineIdRegistry {
    /// Atomically claims `slot` for `instance` if the slot is free,
    /// expired, or already held by the same identity (refreshing the
    /// expiry). Returns `false` if another live identity holds it — the
    /// store's atomicity is the tie-breaker between racing claimants.
    async fn try_claim(
        &self,
        namespace: &str,
        machine_bits: u32,
        slot: u64,
        instance: &InstanceId,
        expiry: Expiry,
    ) -> Result<bool>;

    /// Returns the slot `instance` currently holds a live lease on, if
    /// any.
    async fn find_held(
        &self,
        namespace: &str,
        machine_bits: u32,
        instance: &InstanceId,
    ) -> Result<Option<u64>>;

    /// Drops every lease `instance` holds within `namespace`, across all
    /// machine-bit widths. Returns `true` if anything was released.
    async fn release(&self, namespace: &str, instance: &InstanceId) -> Result<bool>;

    /// Snapshot of every slot in `(namespace, machine_bits)`, for
    /// inspection and capacity planning.
    async fn leases(&self, namespace: &str, machine_bits: u32) -> Result<Vec<Option<MachineLease>>>;
}

type SlotTable = Vec<Option<MachineLease>>;

/// Reference [`MachineIdRegistry`] backed by process memory.
///
/// A single async mutex serializes every operation, which trivially
/// provides the claim-if-absent-or-expired atomicity the trait demands.
/// Suitable for tests and single-store deployments; distributed
/// deployments implement the trait over a shared store instead.
#[derive(Default)]
pub struct InMemoryRegistry {
    spaces: Mutex<HashMap<(String, u32), SlotTable>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MachineIdRegistry for InMemoryRegistry {
    async fn try_claim(
        &self,
        namespace: &str,
        machine_bits: u32,
        slot: u64,
        instance: &InstanceId,
        expiry: Expiry,
    ) -> Result<bool> {
        let now = Instant::now();
        let mut spaces = self.spaces.lock().await;
        let table = spaces
            .entry((namespace.to_owned(), machine_bits))
            .or_insert_with(|| vec![None; 1 << machine_bits]);

        let entry = &mut table[slot as usize];
        match entry {
            Some(lease) if lease.is_live(now) && lease.instance != *instance => Ok(false),
            _ => {
                *entry = Some(MachineLease {
                    instance: instance.clone(),
                    expires_at: expiry,
                });
                Ok(true)
            }
        }
    }

    async fn find_held(
        &self,
        namespace: &str,
        machine_bits: u32,
        instance: &InstanceId,
    ) -> Result<Option<u64>> {
        let now = Instant::now();
        let spaces = self.spaces.lock().await;
        let Some(table) = spaces.get(&(namespace.to_owned(), machine_bits)) else {
            return Ok(None);
        };
        Ok(table.iter().position(|entry| {
            entry
                .as_ref()
                .is_some_and(|lease| lease.instance == *instance && lease.is_live(now))
        }).map(|slot| slot as u64))
    }

    async fn release(&self, namespace: &str, instance: &InstanceId) -> Result<bool> {
        let mut spaces = self.spaces.lock().await;
        let mut released = false;
        for ((ns, _), table) in spaces.iter_mut() {
            if ns != namespace {
                continue;
            }
            for entry in table.iter_mut() {
                if entry.as_ref().is_some_and(|lease| lease.instance == *instance) {
                    *entry = None;
                    released = true;
                }
            }
        }
        Ok(released)
    }

    async fn leases(&self, namespace: &str, machine_bits: u32) -> Result<Vec<Option<MachineLease>>> {
        let spaces = self.spaces.lock().await;
        Ok(spaces
            .get(&(namespace.to_owned(), machine_bits))
            .cloned()
            .unwrap_or_else(|| vec![None; 1 << machine_bits]))
    }
}
