use anchorhash::{AnchorHash, Builder};
use std::collections::HashSet;
use std::hash::{BuildHasherDefault, DefaultHasher};

type DeterministicHasher = BuildHasherDefault<DefaultHasher>;

/// Consistent hash ring over peer addresses, using the AnchorHash algorithm
/// for minimal key remapping when peers come and go.
///
/// The hasher is deterministic so that every node in the cluster maps a
/// given key to the same owner.
#[derive(Clone)]
pub struct HashRing {
    anchor: Option<AnchorHash<u64, String, DeterministicHasher>>,
    self_addr: String,
    peers: HashSet<String>,
}

impl HashRing {
    pub fn new(self_addr: &str) -> Self {
        Self {
            anchor: None,
            self_addr: self_addr.to_string(),
            peers: HashSet::new(),
        }
    }

    /// Replace the full peer set. No-op if the set is unchanged.
    pub fn rebuild(&mut self, peer_addrs: Vec<String>) {
        let new_peers: HashSet<String> = peer_addrs.into_iter().collect();
        if new_peers == self.peers {
            return;
        }
        self.peers = new_peers;
        self.rebuild_anchor();
    }

    fn rebuild_anchor(&mut self) {
        if self.peers.is_empty() {
            self.anchor = None;
            return;
        }

        let mut peer_addrs: Vec<String> = self.peers.iter().cloned().collect();
        peer_addrs.sort();

        let capacity = peer_addrs.len().max(16).min(u16::MAX as usize) as u16;
        self.anchor = Some(
            Builder::with_hasher(DeterministicHasher::default())
                .with_resources(peer_addrs)
                .build(capacity),
        );
    }

    /// The peer that owns the given key, or `None` when the ring is empty.
    pub fn owner_of(&self, key: &str) -> Option<&str> {
        let anchor = self.anchor.as_ref()?;
        anchor.get_resource(Self::hash_key(key)).map(String::as_str)
    }

    /// Whether this node should serve the given key itself. True when the
    /// ring is empty or has no owner for the key.
    pub fn is_local(&self, key: &str) -> bool {
        match self.owner_of(key) {
            Some(owner) => owner == self.self_addr,
            None => true,
        }
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    #[inline]
    fn hash_key(key: &str) -> u64 {
        const FNV_OFFSET: u64 = 0xcbf29ce484222325;
        const FNV_PRIME: u64 = 0x100000001b3;

        let mut hash = FNV_OFFSET;
        for byte in key.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }
}
