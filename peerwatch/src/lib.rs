//! Kubernetes-backed peer membership tracking.
//!
//! This crate keeps a cache pool's peer list in sync with the ready members
//! of a dynamically scaled pod group:
//! - One-shot initial snapshot of ready pods (always including self)
//! - Long-lived watch on pod readiness transitions
//! - Bounded notification queue with a startup gate, so transitions observed
//!   while the initial snapshot is still being installed are held and then
//!   delivered in order
//! - A synchronizer that owns the authoritative peer set and pushes the full
//!   sorted list to the pool on every change
//!
//! The view is eventually consistent and best-effort: there is no consensus,
//! no retry of individual transitions, and no automatic reconnect when the
//! watch stream ends.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use peerwatch::{
//!     fetch_initial, watch, KubeCluster, PoolSynchronizer, StartupGate,
//!     TransitionNotifier,
//! };
//!
//! let cluster = KubeCluster::connect("app=factorcache", 5000).await?;
//! let sync = Arc::new(PoolSynchronizer::new(pool));
//! let (notifier, rx) = TransitionNotifier::channel();
//! let gate = StartupGate::new();
//!
//! peerwatch::spawn_dispatcher(rx, gate.subscribe(), sync.clone(), cancel.clone());
//! let initial = fetch_initial(&cluster, &self_addr).await?;
//! tokio::spawn(watch(cluster, self_addr, initial.clone(), notifier, cancel));
//!
//! sync.seed(initial);
//! gate.open();
//! ```

mod cluster;
mod error;
mod gate;
mod member;
mod notify;
mod readiness;
mod snapshot;
mod sync;
mod watcher;

pub use cluster::KubeCluster;
pub use error::Error;
pub use gate::{GateWait, StartupGate};
pub use member::{Member, MemberEvent, PeerSet};
pub use notify::{spawn_dispatcher, Transition, TransitionNotifier};
pub use readiness::is_ready;
pub use snapshot::{fetch_initial, snapshot_from_members};
pub use sync::{PeerSink, PoolSynchronizer};
pub use watcher::{run_watch, watch};
