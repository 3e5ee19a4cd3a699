//! Consistent-hashed, HTTP-peered read-through cache pool.
//!
//! Each key has exactly one owning peer, chosen by AnchorHash over the
//! current peer list. A lookup hits the local cache first, then either loads
//! locally (when this node owns the key) or fills from the owner over HTTP.
//! The peer list is replaced atomically via [`HashPool::set_peers`]; readers
//! never observe a partially-updated list.
//!
//! Peer-set maintenance is someone else's job: a membership tracker calls
//! `set_peers` with the full sorted list whenever the cluster changes.

mod error;
mod pool;
mod ring;

pub use error::Error;
pub use pool::{HashPool, Loader, PEER_FILL_PATH};
pub use ring::HashRing;
