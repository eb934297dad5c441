use core::fmt;
use core::hash::{Hash, Hasher};

/// The identity of one running generator instance.
///
/// Identity is the stable network address (`host:port`) — never an
/// ephemeral process id — so an instance that restarts under the same
/// address is the *same* identity and recovers its prior machine id.
///
/// The `stable` flag marks long-lived instances: a stable instance's lease
/// is never released by `revert`, only by expiry or administrative
/// eviction. The flag is deliberately excluded from equality and hashing:
/// flipping it does not create a new identity.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct InstanceId {
    host: String,
    port: u16,
    stable: bool,
}

impl InstanceId {
    pub fn new(host: impl Into<String>, port: u16, stable: bool) -> Self {
        Self {
            host: host.into(),
            port,
            stable,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Whether this instance is long-lived and keeps its lease across
    /// `revert` calls.
    pub const fn is_stable(&self) -> bool {
        self.stable
    }
}

impl PartialEq for InstanceId {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for InstanceId {}

impl Hash for InstanceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_is_by_address_not_stability() {
        let stable = InstanceId::new("10.0.0.1", 80, true);
        let unstable = InstanceId::new("10.0.0.1", 80, false);
        assert_eq!(stable, unstable);

        let mut set = HashSet::new();
        set.insert(stable);
        assert!(set.contains(&unstable));
    }

    #[test]
    fn different_ports_are_different_identities() {
        assert_ne!(
            InstanceId::new("10.0.0.1", 80, true),
            InstanceId::new("10.0.0.1", 81, true)
        );
    }

    #[test]
    fn displays_as_host_port() {
        assert_eq!(InstanceId::new("10.0.0.1", 80, true).to_string(), "10.0.0.1:80");
    }
}
