use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::cluster::KubeCluster;
use crate::error::Error;
use crate::member::{MemberEvent, PeerSet};
use crate::notify::{Transition, TransitionNotifier};

/// Open the watch subscription and drive the event loop until the stream
/// ends or `cancel` fires.
///
/// If the subscription cannot be opened, logs a warning and returns without
/// entering the loop: the process keeps serving with its initial peer set.
/// Reconnection is deliberately left to a wrapping supervisor.
pub async fn watch(
    cluster: KubeCluster,
    self_addr: String,
    initial: PeerSet,
    notifier: TransitionNotifier,
    cancel: CancellationToken,
) {
    let events = match cluster.watch_events().await {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!("Not watching cluster membership: {e}");
            return;
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => tracing::debug!("Membership watcher cancelled"),
        _ = run_watch(events, &self_addr, initial, &notifier) => {
            tracing::warn!("Membership watch stream ended");
        }
    }
}

/// Consume raw membership events in arrival order, emitting a transition
/// whenever a member's readiness differs from the working view.
///
/// Pods that are created or destroyed go through several `Modified` events,
/// and readiness flips are only reported through those, so only `Modified`
/// events drive transitions; raw `Added`/`Deleted` events are observed at
/// debug level. Events for self or for members without an address are
/// skipped. Repeated identical events produce no further transitions.
pub async fn run_watch<E>(
    mut events: E,
    self_addr: &str,
    initial: PeerSet,
    notifier: &TransitionNotifier,
) where
    E: Stream<Item = Result<MemberEvent, Error>> + Unpin,
{
    let mut known = initial;
    tracing::debug!(peers = %known, "Watching membership from initial view");

    while let Some(item) = events.next().await {
        let event = match item {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Skipping watch event: {e}");
                continue;
            }
        };

        let member = event.member();
        tracing::debug!(
            kind = event.kind(),
            name = %member.name,
            addr = %member.addr,
            ready = member.ready,
            "Membership event"
        );

        let MemberEvent::Modified(member) = event else {
            continue;
        };
        if member.addr.is_empty() || member.addr == self_addr {
            continue;
        }

        let transition = if member.ready && !known.contains(&member.addr) {
            known.insert(&member.addr);
            Transition::Added(member.addr)
        } else if !member.ready && known.contains(&member.addr) {
            known.remove(&member.addr);
            Transition::Removed(member.addr)
        } else {
            continue;
        };

        if !notifier.notify(transition).await {
            tracing::warn!("Transition queue closed, stopping watch");
            return;
        }
    }
}
