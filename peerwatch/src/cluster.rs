use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ListParams, WatchEvent, WatchParams};
use kube::{Api, Client};

use crate::error::Error;
use crate::member::{Member, MemberEvent};

/// The cluster membership API, scoped to one pod group.
///
/// Wraps a namespaced pod API filtered by a label selector. Peer addresses
/// are derived from each pod's IP plus a fixed peer port.
pub struct KubeCluster {
    pods: Api<Pod>,
    selector: String,
    peer_port: u16,
}

impl KubeCluster {
    /// Connect using the ambient configuration (in-cluster service account
    /// when running in a pod, kubeconfig otherwise).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if no client configuration is available.
    pub async fn connect(selector: &str, peer_port: u16) -> Result<Self, Error> {
        let client = Client::try_default().await?;
        Ok(Self::with_client(client, selector, peer_port))
    }

    pub fn with_client(client: Client, selector: &str, peer_port: u16) -> Self {
        Self {
            pods: Api::default_namespaced(client),
            selector: selector.to_string(),
            peer_port,
        }
    }

    /// One-shot listing of the current members matching the selector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the listing call fails.
    pub async fn list_members(&self) -> Result<Vec<Member>, Error> {
        let lp = ListParams::default().labels(&self.selector);
        let pods = self.pods.list(&lp).await?;
        Ok(pods
            .items
            .iter()
            .map(|pod| Member::from_pod(pod, self.peer_port))
            .collect())
    }

    /// Open a long-lived watch subscription scoped by the selector.
    ///
    /// Bookmark events are dropped. Error payloads from the stream surface as
    /// [`Error::MalformedEvent`] items so the caller can log and continue.
    /// The stream ends when the cluster API closes it; there is no automatic
    /// reconnect here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WatchOpen`] if the subscription cannot be opened.
    pub async fn watch_events(
        &self,
    ) -> Result<BoxStream<'static, Result<MemberEvent, Error>>, Error> {
        let wp = WatchParams::default().labels(&self.selector);
        let stream = self
            .pods
            .watch(&wp, "0")
            .await
            .map_err(|e| Error::WatchOpen(e.to_string()))?;

        let peer_port = self.peer_port;
        Ok(stream
            .filter_map(move |item| {
                let decoded = match item {
                    Ok(event) => decode_event(event, peer_port),
                    Err(e) => Some(Err(Error::MalformedEvent(e.to_string()))),
                };
                futures_util::future::ready(decoded)
            })
            .boxed())
    }
}

fn decode_event(event: WatchEvent<Pod>, peer_port: u16) -> Option<Result<MemberEvent, Error>> {
    match event {
        WatchEvent::Added(pod) => Some(Ok(MemberEvent::Added(Member::from_pod(&pod, peer_port)))),
        WatchEvent::Modified(pod) => {
            Some(Ok(MemberEvent::Modified(Member::from_pod(&pod, peer_port))))
        }
        WatchEvent::Deleted(pod) => {
            Some(Ok(MemberEvent::Deleted(Member::from_pod(&pod, peer_port))))
        }
        WatchEvent::Bookmark(_) => None,
        WatchEvent::Error(e) => Some(Err(Error::MalformedEvent(e.message))),
    }
}
