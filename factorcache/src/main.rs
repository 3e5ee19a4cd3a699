use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use dotenv::dotenv;
use tokio::signal;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hashpool::{HashPool, PEER_FILL_PATH};
use peerwatch::{
    fetch_initial, spawn_dispatcher, watch, KubeCluster, PeerSet, PeerSink, PoolSynchronizer,
    StartupGate, TransitionNotifier,
};

mod config;
mod factors;

use config::Config;
use factors::FactorLoader;

/// Feeds peer-set pushes from the synchronizer into the cache pool.
struct PoolSink(Arc<HashPool>);

impl PeerSink for PoolSink {
    fn set_peers(&self, peers: Vec<String>) {
        self.0.set_peers(peers);
    }
}

async fn index() -> &'static str {
    "Hello world\n"
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn factors_handler(
    Path(n): Path<String>,
    State(pool): State<Arc<HashPool>>,
) -> impl IntoResponse {
    if n.parse::<u64>().is_err() {
        return (
            StatusCode::BAD_REQUEST,
            "expected a non-negative integer\n".to_string(),
        );
    }
    match pool.get(&n).await {
        Ok(value) => (StatusCode::OK, format!("{value}\n")),
        Err(e) => {
            tracing::error!("Factor lookup for {n} failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error\n".into())
        }
    }
}

/// Peer-facing cache fill. Always loads locally; forwarding here would let
/// a stale ring bounce a request between nodes forever.
async fn pool_fill_handler(
    Path(key): Path<String>,
    State(pool): State<Arc<HashPool>>,
) -> impl IntoResponse {
    match pool.load_local(&key).await {
        Ok(value) => (StatusCode::OK, value),
        Err(e) => {
            tracing::warn!("Peer fill for {key:?} failed: {e}");
            (StatusCode::BAD_REQUEST, String::new())
        }
    }
}

fn init_tracing(config: &Config) {
    let default_filter = if config.debug {
        "info,peerwatch=debug,hashpool=debug,factorcache=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let is_production = std::env::var("NODE_ENV").unwrap_or_default() == "production";
    if is_production {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

/// Establish the initial peer set and start the membership watcher.
///
/// Every failure along the way degrades to a single-node peer set: a cache
/// node that cannot see its cluster still serves traffic alone.
async fn start_membership(
    config: &Config,
    self_addr: &str,
    notifier: TransitionNotifier,
    cancel: CancellationToken,
) -> PeerSet {
    let mut fallback = PeerSet::new();
    fallback.insert(self_addr);

    if config.pod_ip.is_none() {
        tracing::info!("POD_IP not set, running single-node");
        return fallback;
    }

    let cluster = match KubeCluster::connect(&config.selector, config.port).await {
        Ok(cluster) => cluster,
        Err(e) => {
            tracing::warn!("No cluster API access, running single-node: {e}");
            return fallback;
        }
    };

    let initial = match fetch_initial(&cluster, self_addr).await {
        Ok(initial) => initial,
        Err(e) => {
            tracing::warn!("Initial member listing failed, running single-node: {e}");
            return fallback;
        }
    };

    tracing::info!(peers = %initial, "Cluster membership established");
    tokio::spawn(watch(
        cluster,
        self_addr.to_string(),
        initial.clone(),
        notifier,
        cancel,
    ));
    initial
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = Config::from_env();
    init_tracing(&config);

    let self_addr = config
        .self_addr()
        .unwrap_or_else(|| format!("127.0.0.1:{}", config.port));

    let pool = Arc::new(HashPool::new(&self_addr, Arc::new(FactorLoader)));
    let synchronizer = Arc::new(PoolSynchronizer::new(PoolSink(pool.clone())));
    let gate = StartupGate::new();
    let cancel = CancellationToken::new();
    let (notifier, transition_rx) = TransitionNotifier::channel();

    let dispatcher = spawn_dispatcher(
        transition_rx,
        gate.subscribe(),
        synchronizer.clone(),
        cancel.clone(),
    );

    // The watcher may start delivering transitions immediately; the gate
    // holds them until the snapshot below has been installed.
    let initial = start_membership(&config, &self_addr, notifier, cancel.clone()).await;
    synchronizer.seed(initial);
    gate.open();

    let app = Router::new()
        .route("/", get(index))
        .route("/factors/:n", get(factors_handler))
        .route(&format!("{PEER_FILL_PATH}/:key"), get(pool_fill_handler))
        .route("/health", get(health))
        .route("/healthz/ready", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(pool.clone());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %self_addr, "Serving");

    let shutdown = Arc::new(Notify::new());
    let shutdown_for_server = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_for_server.notified().await;
            })
            .await
    });

    wait_for_shutdown_signal().await;
    shutdown.notify_waiters();
    cancel.cancel();

    match tokio::time::timeout(Duration::from_secs(25), server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::warn!("Server error during shutdown: {e}"),
        Ok(Err(e)) => tracing::warn!("Server task error: {e:?}"),
        Err(_) => tracing::warn!("Server shutdown timed out after 25s"),
    }
    let _ = dispatcher.await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}
