use std::env;

/// Default HTTP port, also the fixed peer port baked into peer addresses.
pub const DEFAULT_PORT: u16 = 5000;

const DEFAULT_SELECTOR: &str = "app=factorcache";

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to serve on; peers are assumed to listen on the same port.
    pub port: u16,
    /// This pod's IP. Absent outside a cluster; the node then runs
    /// single-node without membership tracking.
    pub pod_ip: Option<String>,
    /// Label selector scoping which pods count as cache siblings.
    pub selector: String,
    /// Verbose transition logging (widens the default log filter).
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let pod_ip = env::var("POD_IP").ok().filter(|ip| !ip.is_empty());
        let selector =
            env::var("POD_LABEL_SELECTOR").unwrap_or_else(|_| DEFAULT_SELECTOR.to_string());
        let debug = env::var("PEERWATCH_DEBUG").as_deref() == Ok("true");

        Self {
            port,
            pod_ip,
            selector,
            debug,
        }
    }

    /// This node's peer address, when running in a cluster.
    pub fn self_addr(&self) -> Option<String> {
        self.pod_ip.as_ref().map(|ip| format!("{ip}:{}", self.port))
    }
}
