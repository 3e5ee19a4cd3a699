use crate::cluster::KubeCluster;
use crate::error::Error;
use crate::member::{Member, PeerSet};

/// Build the initial peer set from a membership listing.
///
/// `self_addr` is always included (self is assumed ready; its own readiness
/// probe has no bearing on whether it should route to itself). A listed
/// member is included iff it is ready, has an address, and is not self.
///
/// # Errors
///
/// Returns [`Error::EmptySnapshot`] if the result is empty, which is only
/// possible with an empty `self_addr` and signals a misconfigured self
/// address upstream.
pub fn snapshot_from_members(members: &[Member], self_addr: &str) -> Result<PeerSet, Error> {
    let mut set = PeerSet::new();
    set.insert(self_addr);
    for member in members {
        if member.ready && member.addr != self_addr {
            set.insert(&member.addr);
        }
    }
    if set.is_empty() {
        return Err(Error::EmptySnapshot);
    }
    Ok(set)
}

/// Fetch the one-time initial snapshot of ready members, including self.
///
/// # Errors
///
/// Returns [`Error::Query`] if the listing call fails and
/// [`Error::EmptySnapshot`] per [`snapshot_from_members`]. Both are fatal to
/// cluster-aware mode; the caller should degrade to a single-node peer set
/// rather than crash.
pub async fn fetch_initial(cluster: &KubeCluster, self_addr: &str) -> Result<PeerSet, Error> {
    let members = cluster.list_members().await?;
    let set = snapshot_from_members(&members, self_addr)?;
    tracing::debug!(peers = %set, "Initial peer snapshot");
    Ok(set)
}
