use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The initial membership listing failed. Fatal to cluster-aware mode;
    /// the caller should fall back to a single-node peer set.
    #[error("cluster membership query failed: {0}")]
    Query(#[from] kube::Error),

    /// The initial snapshot came back empty even after adding self.
    /// Only reachable with an empty self address, i.e. misconfiguration.
    #[error("initial snapshot contained no members, not even self")]
    EmptySnapshot,

    /// The watch subscription could not be opened. Non-fatal: the watcher
    /// simply does not run and the process stays on its initial peer set.
    #[error("could not open watch subscription: {0}")]
    WatchOpen(String),

    /// The stream delivered a payload that is not a recognizable member
    /// record. Logged and skipped; the stream continues.
    #[error("unrecognized watch payload: {0}")]
    MalformedEvent(String),
}
