use tokio::sync::watch;

/// One-shot startup barrier between snapshot installation and transition
/// delivery.
///
/// The watcher can start before the caller has finished seeding the
/// synchronizer with the initial snapshot. Transitions queue up in the
/// notifier channel; the dispatcher waits on this gate before draining them,
/// so a queued transition can never be overwritten by the (stale) snapshot.
/// Waiting blocks on a signal rather than polling.
pub struct StartupGate {
    tx: watch::Sender<bool>,
}

impl StartupGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Fire the ready signal. Idempotent; waiters past the gate are
    /// unaffected.
    pub fn open(&self) {
        let _ = self.tx.send(true);
    }

    pub fn subscribe(&self) -> GateWait {
        GateWait {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for StartupGate {
    fn default() -> Self {
        Self::new()
    }
}

/// A waiter on a [`StartupGate`].
pub struct GateWait {
    rx: watch::Receiver<bool>,
}

impl GateWait {
    /// Resolve once the gate has opened. Returns immediately if it already
    /// has, including when the gate itself has been dropped after opening.
    pub async fn opened(mut self) {
        let _ = self.rx.wait_for(|open| *open).await;
    }
}
