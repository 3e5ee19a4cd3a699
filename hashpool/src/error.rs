use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("peer request failed: {0}")]
    Peer(#[from] reqwest::Error),

    #[error("peer returned status {0}")]
    PeerStatus(reqwest::StatusCode),

    #[error("load failed: {0}")]
    Load(String),
}
