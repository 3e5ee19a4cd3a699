use std::collections::BTreeSet;
use std::fmt;

use k8s_openapi::api::core::v1::Pod;

use crate::readiness::is_ready;

/// A decoded cluster member record.
///
/// `addr` is `"<pod-ip>:<peer-port>"`, or empty while the pod has no IP yet
/// (pods go through several phases before an IP is assigned).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub addr: String,
    pub ready: bool,
}

impl Member {
    /// Decode a pod into a member record, deriving the peer address from the
    /// pod IP plus the fixed peer port.
    pub fn from_pod(pod: &Pod, peer_port: u16) -> Self {
        let name = pod.metadata.name.clone().unwrap_or_default();
        let status = pod.status.as_ref();
        let addr = status
            .and_then(|s| s.pod_ip.as_deref())
            .map(|ip| format!("{ip}:{peer_port}"))
            .unwrap_or_default();
        let ready = status
            .and_then(|s| s.conditions.as_deref())
            .map(is_ready)
            .unwrap_or(false);
        Self { name, addr, ready }
    }
}

/// A raw membership change, tagged by the cluster API's event kind.
///
/// Only `Modified` events drive peer-set transitions; `Added` and `Deleted`
/// are observed for logging only, since the upstream API reports readiness
/// changes through `Modified` events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberEvent {
    Added(Member),
    Modified(Member),
    Deleted(Member),
}

impl MemberEvent {
    pub fn member(&self) -> &Member {
        match self {
            Self::Added(m) | Self::Modified(m) | Self::Deleted(m) => m,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added(_) => "ADDED",
            Self::Modified(_) => "MODIFIED",
            Self::Deleted(_) => "DELETED",
        }
    }
}

/// The set of currently reachable peer addresses.
///
/// Unique, never contains the empty address, and renders in sorted order so
/// every push to the pool is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerSet {
    addrs: BTreeSet<String>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an address. Returns false if it was already present or empty.
    pub fn insert(&mut self, addr: &str) -> bool {
        if addr.is_empty() {
            return false;
        }
        self.addrs.insert(addr.to_string())
    }

    /// Remove an address. Returns false if it was absent.
    pub fn remove(&mut self, addr: &str) -> bool {
        self.addrs.remove(addr)
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.addrs.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// All addresses in sorted order.
    pub fn sorted_addrs(&self) -> Vec<String> {
        self.addrs.iter().cloned().collect()
    }
}

impl fmt::Display for PeerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, addr) in self.addrs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{addr}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{PodCondition, PodStatus};

    #[test]
    fn test_peer_set_sorted_addrs() {
        let mut set = PeerSet::new();
        set.insert("10.0.0.3:5000");
        set.insert("10.0.0.1:5000");
        set.insert("10.0.0.2:5000");

        assert_eq!(
            set.sorted_addrs(),
            vec!["10.0.0.1:5000", "10.0.0.2:5000", "10.0.0.3:5000"]
        );
    }

    #[test]
    fn test_peer_set_rejects_empty_addr() {
        let mut set = PeerSet::new();
        assert!(!set.insert(""));
        assert!(set.is_empty());
    }

    #[test]
    fn test_peer_set_insert_is_idempotent() {
        let mut set = PeerSet::new();
        assert!(set.insert("10.0.0.1:5000"));
        assert!(!set.insert("10.0.0.1:5000"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_peer_set_remove_absent() {
        let mut set = PeerSet::new();
        assert!(!set.remove("10.0.0.1:5000"));
    }

    #[test]
    fn test_peer_set_display() {
        let mut set = PeerSet::new();
        set.insert("b:5000");
        set.insert("a:5000");
        assert_eq!(set.to_string(), "[a:5000, b:5000]");
    }

    #[test]
    fn test_member_from_pod() {
        let pod = Pod {
            metadata: kube::api::ObjectMeta {
                name: Some("factorcache-abc12".into()),
                ..Default::default()
            },
            status: Some(PodStatus {
                pod_ip: Some("10.0.0.7".into()),
                conditions: Some(vec![PodCondition {
                    type_: "Ready".into(),
                    status: "True".into(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let member = Member::from_pod(&pod, 5000);
        assert_eq!(member.name, "factorcache-abc12");
        assert_eq!(member.addr, "10.0.0.7:5000");
        assert!(member.ready);
    }

    #[test]
    fn test_member_from_pod_without_ip() {
        let pod = Pod {
            status: Some(PodStatus::default()),
            ..Default::default()
        };
        let member = Member::from_pod(&pod, 5000);
        assert!(member.addr.is_empty());
        assert!(!member.ready);
    }
}
