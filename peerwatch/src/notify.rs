use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::gate::GateWait;
use crate::sync::{PeerSink, PoolSynchronizer};

/// Bounded queue capacity for pending transitions. Membership churn is rare;
/// this only fills if the dispatcher is gated for a long time at startup.
const QUEUE_CAPACITY: usize = 256;

/// A peer's change of membership in the active set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Added(String),
    Removed(String),
}

impl Transition {
    pub fn addr(&self) -> &str {
        match self {
            Self::Added(addr) | Self::Removed(addr) => addr,
        }
    }
}

/// Sender side of the transition queue.
///
/// Decouples transition detection from reaction: the watcher enqueues and
/// moves on, and a dispatcher task applies transitions in arrival order. The
/// queue is bounded, so a stalled dispatcher backpressures the watcher
/// instead of buffering without limit.
#[derive(Clone)]
pub struct TransitionNotifier {
    tx: mpsc::Sender<Transition>,
}

impl TransitionNotifier {
    pub fn channel() -> (Self, mpsc::Receiver<Transition>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        (Self { tx }, rx)
    }

    /// Enqueue a transition. Waits for queue space; returns false if the
    /// receiving side is gone (dispatcher stopped), which ends the watch.
    pub async fn notify(&self, transition: Transition) -> bool {
        self.tx.send(transition).await.is_ok()
    }
}

/// Spawn the dispatcher task: wait for the startup gate, then apply queued
/// transitions to the synchronizer in arrival order until the channel closes
/// or cancellation fires.
pub fn spawn_dispatcher<S>(
    mut rx: mpsc::Receiver<Transition>,
    gate: GateWait,
    synchronizer: Arc<PoolSynchronizer<S>>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: PeerSink + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = gate.opened() => {}
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                transition = rx.recv() => match transition {
                    Some(transition) => synchronizer.apply(&transition),
                    None => break,
                },
            }
        }
        tracing::debug!("Transition dispatcher shutting down");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StartupGate;
    use crate::member::PeerSet;
    use crate::sync::tests::RecordingSink;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dispatcher_holds_transitions_until_gate_opens() {
        let sink = RecordingSink::default();
        let synchronizer = Arc::new(PoolSynchronizer::new(sink.clone()));
        let gate = StartupGate::new();
        let (notifier, rx) = TransitionNotifier::channel();
        let cancel = CancellationToken::new();
        let handle = spawn_dispatcher(rx, gate.subscribe(), synchronizer.clone(), cancel.clone());

        assert!(notifier.notify(Transition::Added("c:5000".into())).await);
        assert!(notifier.notify(Transition::Removed("a:5000".into())).await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sink.pushes().is_empty(), "nothing may land before seeding");

        let mut initial = PeerSet::new();
        initial.insert("a:5000");
        initial.insert("b:5000");
        synchronizer.seed(initial);
        gate.open();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            sink.pushes(),
            vec![
                vec!["a:5000".to_string(), "b:5000".to_string()],
                vec!["a:5000".to_string(), "b:5000".to_string(), "c:5000".to_string()],
                vec!["b:5000".to_string(), "c:5000".to_string()],
            ]
        );

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatcher_stops_when_channel_closes() {
        let synchronizer = Arc::new(PoolSynchronizer::new(RecordingSink::default()));
        let gate = StartupGate::new();
        let (notifier, rx) = TransitionNotifier::channel();
        let handle = spawn_dispatcher(
            rx,
            gate.subscribe(),
            synchronizer,
            CancellationToken::new(),
        );

        gate.open();
        drop(notifier);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatcher should exit")
            .unwrap();
    }
}
