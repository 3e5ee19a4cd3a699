use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use moka::future::Cache;

use crate::error::Error;
use crate::ring::HashRing;

/// Route peer cache fills are served under, relative to a peer's address.
pub const PEER_FILL_PATH: &str = "/_pool";

/// Timeout for a single peer fill; a slow peer should not be worse than
/// computing locally.
const PEER_FILL_TIMEOUT: Duration = Duration::from_secs(2);

const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Computes the value for a key when this node is the owner (or has to
/// degrade to local computation).
pub trait Loader: Send + Sync {
    fn load(&self, key: &str) -> Result<String, Error>;
}

/// A consistent-hashed read-through cache with HTTP peer fills.
///
/// `get` consults the local cache, then routes to the key's owner: loads
/// locally when this node owns the key, otherwise fetches from the owning
/// peer and caches the result. When the owning peer cannot be reached the
/// pool degrades to a local load; a stale peer list must not fail reads
/// while the membership tracker catches up.
///
/// The ring swap in [`set_peers`](HashPool::set_peers) is a single atomic
/// pointer store, so lookups racing a membership change see either the old
/// complete list or the new complete list, never a mix.
pub struct HashPool {
    ring: ArcSwap<HashRing>,
    cache: Cache<String, String>,
    http: reqwest::Client,
    loader: Arc<dyn Loader>,
    self_addr: String,
}

impl HashPool {
    pub fn new(self_addr: &str, loader: Arc<dyn Loader>) -> Self {
        Self::with_capacity(self_addr, loader, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(self_addr: &str, loader: Arc<dyn Loader>, capacity: u64) -> Self {
        Self {
            ring: ArcSwap::from_pointee(HashRing::new(self_addr)),
            cache: Cache::new(capacity),
            http: reqwest::Client::new(),
            loader,
            self_addr: self_addr.to_string(),
        }
    }

    /// Atomically replace the peer list.
    pub fn set_peers(&self, peers: Vec<String>) {
        let mut ring = (**self.ring.load()).clone();
        ring.rebuild(peers);
        tracing::debug!(peers = ring.peer_count(), "Peer list replaced");
        self.ring.store(Arc::new(ring));
    }

    pub fn peer_count(&self) -> usize {
        self.ring.load().peer_count()
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    /// Read-through lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] when the loader itself fails. Peer failures
    /// are absorbed by the local fallback.
    pub async fn get(&self, key: &str) -> Result<String, Error> {
        if let Some(value) = self.cache.get(key).await {
            return Ok(value);
        }

        let owner = self.ring.load().owner_of(key).map(str::to_string);
        match owner {
            Some(owner) if owner != self.self_addr => match self.fill_from_peer(&owner, key).await
            {
                Ok(value) => {
                    self.cache.insert(key.to_string(), value.clone()).await;
                    Ok(value)
                }
                Err(e) => {
                    tracing::warn!(%owner, key, "Peer fill failed, loading locally: {e}");
                    self.load_local(key).await
                }
            },
            _ => self.load_local(key).await,
        }
    }

    /// Load the value locally and cache it. Used directly by the peer-facing
    /// fill handler, which must never forward (no forwarding loops).
    pub async fn load_local(&self, key: &str) -> Result<String, Error> {
        let value = self.loader.load(key)?;
        self.cache.insert(key.to_string(), value.clone()).await;
        Ok(value)
    }

    async fn fill_from_peer(&self, owner: &str, key: &str) -> Result<String, Error> {
        let url = format!("http://{owner}{PEER_FILL_PATH}/{key}");
        let response = self
            .http
            .get(&url)
            .timeout(PEER_FILL_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::PeerStatus(response.status()));
        }
        Ok(response.text().await?)
    }
}
