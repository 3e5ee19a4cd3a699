use std::sync::Mutex;

use crate::member::PeerSet;
use crate::notify::Transition;

/// The cache pool's peer-set API: replace the full peer list atomically.
///
/// Implementations must treat each call as a complete replacement; the list
/// is always the sorted contents of the current membership set, never a
/// partial update.
pub trait PeerSink: Send + Sync {
    fn set_peers(&self, peers: Vec<String>);
}

/// Owns the authoritative membership set and keeps the pool in step with it.
///
/// All mutation goes through here: the watcher only detects transitions, and
/// the dispatcher applies them. Mutation and the subsequent push are one
/// critical section, so concurrent transitions cannot interleave into a
/// corrupted push.
pub struct PoolSynchronizer<S> {
    sink: S,
    members: Mutex<PeerSet>,
}

impl<S: PeerSink> PoolSynchronizer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            members: Mutex::new(PeerSet::new()),
        }
    }

    /// Install the starting membership set and push it to the pool.
    ///
    /// Called exactly once at startup, before any transition is applied;
    /// the startup gate enforces that ordering.
    pub fn seed(&self, initial: PeerSet) {
        let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        *members = initial;
        tracing::info!(peers = %members, "Seeded peer set");
        self.sink.set_peers(members.sorted_addrs());
    }

    /// Apply one transition and push the updated peer list.
    ///
    /// No-op when the set already reflects the transition (duplicate Added
    /// for a present address, Removed for an absent one).
    pub fn apply(&self, transition: &Transition) {
        let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        let changed = match transition {
            Transition::Added(addr) => members.insert(addr),
            Transition::Removed(addr) => members.remove(addr),
        };
        if !changed {
            return;
        }
        tracing::info!(?transition, peers = %members, "Peer set updated");
        self.sink.set_peers(members.sorted_addrs());
    }

    /// Snapshot of the current peer list, sorted.
    pub fn peers(&self) -> Vec<String> {
        self.members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sorted_addrs()
    }
}
