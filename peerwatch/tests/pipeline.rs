//! End-to-end pipeline tests: snapshot -> watcher -> gate -> synchronizer,
//! with a recording sink standing in for the cache pool.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream;
use tokio_util::sync::CancellationToken;

use peerwatch::{
    run_watch, snapshot_from_members, spawn_dispatcher, Error, Member, MemberEvent, PeerSet,
    PeerSink, PoolSynchronizer, StartupGate, TransitionNotifier,
};

const SELF: &str = "10.0.0.1:5000";

#[derive(Clone, Default)]
struct RecordingPool {
    pushes: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordingPool {
    fn pushes(&self) -> Vec<Vec<String>> {
        self.pushes.lock().unwrap().clone()
    }
}

impl PeerSink for RecordingPool {
    fn set_peers(&self, peers: Vec<String>) {
        self.pushes.lock().unwrap().push(peers);
    }
}

fn member(addr: &str, ready: bool) -> Member {
    Member {
        name: format!("pod-{addr}"),
        addr: addr.to_string(),
        ready,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_snapshot_watch_seed_pipeline() {
    let pool = RecordingPool::default();
    let synchronizer = Arc::new(PoolSynchronizer::new(pool.clone()));
    let gate = StartupGate::new();
    let cancel = CancellationToken::new();
    let (notifier, rx) = TransitionNotifier::channel();
    let dispatcher = spawn_dispatcher(rx, gate.subscribe(), synchronizer.clone(), cancel.clone());

    // Initial snapshot: self plus one ready sibling.
    let listed = vec![member("10.0.0.2:5000", true)];
    let initial = snapshot_from_members(&listed, SELF).unwrap();

    // The watcher starts before seeding; its events must be held by the gate.
    let events = vec![
        Ok(MemberEvent::Modified(member("10.0.0.3:5000", true))),
        Ok(MemberEvent::Modified(member("10.0.0.2:5000", false))),
    ];
    let watch_initial = initial.clone();
    let watch_notifier = notifier.clone();
    let watcher = tokio::spawn(async move {
        run_watch(stream::iter(events), SELF, watch_initial, &watch_notifier).await;
    });

    settle().await;
    assert!(pool.pushes().is_empty(), "no push before seeding");

    synchronizer.seed(initial);
    gate.open();
    watcher.await.unwrap();
    settle().await;

    assert_eq!(
        pool.pushes(),
        vec![
            vec![SELF.to_string(), "10.0.0.2:5000".to_string()],
            vec![
                SELF.to_string(),
                "10.0.0.2:5000".to_string(),
                "10.0.0.3:5000".to_string(),
            ],
            vec![SELF.to_string(), "10.0.0.3:5000".to_string()],
        ]
    );

    cancel.cancel();
    dispatcher.await.unwrap();
}

#[tokio::test]
async fn test_single_node_fallback_still_seeds_self() {
    // A failed listing degrades to a single-element set containing self.
    let err = snapshot_from_members(&[], "").unwrap_err();
    assert!(matches!(err, Error::EmptySnapshot));

    let pool = RecordingPool::default();
    let synchronizer = Arc::new(PoolSynchronizer::new(pool.clone()));

    let mut fallback = PeerSet::new();
    fallback.insert(SELF);
    synchronizer.seed(fallback);

    assert_eq!(pool.pushes(), vec![vec![SELF.to_string()]]);
    assert_eq!(synchronizer.peers(), vec![SELF.to_string()]);
}

#[tokio::test]
async fn test_transitions_after_gate_pass_through_immediately() {
    let pool = RecordingPool::default();
    let synchronizer = Arc::new(PoolSynchronizer::new(pool.clone()));
    let gate = StartupGate::new();
    let cancel = CancellationToken::new();
    let (notifier, rx) = TransitionNotifier::channel();
    let dispatcher = spawn_dispatcher(rx, gate.subscribe(), synchronizer.clone(), cancel.clone());

    let mut initial = PeerSet::new();
    initial.insert(SELF);
    synchronizer.seed(initial.clone());
    gate.open();

    let events = vec![Ok(MemberEvent::Modified(member("10.0.0.9:5000", true)))];
    run_watch(stream::iter(events), SELF, initial, &notifier).await;
    settle().await;

    assert_eq!(
        pool.pushes(),
        vec![
            vec![SELF.to_string()],
            vec![SELF.to_string(), "10.0.0.9:5000".to_string()],
        ]
    );

    cancel.cancel();
    dispatcher.await.unwrap();
}
