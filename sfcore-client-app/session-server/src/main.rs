use axum::http::HeaderName;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use session_api::{router, AppState};
use session_core::{AttributeStore, MemoryStore, RotationLease, SessionAttributes, SessionConfig, SessionManager, SystemClock};
use session_infrastructure::{create_pool, RedisSessionStore};
use session_shared::config::{AppConfig, StoreBackend};

const REQUEST_ID_HEADER: &str = "x-request-id";

fn build_state<S>(store: Arc<S>, config: &AppConfig) -> AppState
where
    S: AttributeStore + RotationLease + 'static,
{
    let session_config = SessionConfig::from(&config.session);
    let attributes = SessionAttributes::new(store.clone(), session_config.session_duration);

    let mut manager = SessionManager::new(store.clone(), session_config.clone());
    if let Some(ttl) = session_config.rotation_lease {
        info!("Rotation lease enabled ({} ms)", ttl.as_millis());
        manager = manager.with_rotation_lease(store, ttl);
    }

    AppState {
        sessions: Arc::new(manager),
        attributes: Arc::new(attributes),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Configuration comes first: it decides the log level and format.
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let _log_guard = session_shared::telemetry::init_telemetry(&config.log);
    info!("{} starting ({})", config.app.name, config.app.env);

    let state = match config.store.backend {
        StoreBackend::Redis => {
            info!("Connecting to Redis at {}...", config.redis.url);
            let pool = create_pool(&config.redis.url, config.redis.max_connections).await?;
            let store = Arc::new(RedisSessionStore::with_prefixes(
                pool,
                &config.redis.key_prefix,
                &config.redis.lease_prefix,
            ));
            build_state(store, &config)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory session store; sessions are lost on restart");
            let store = Arc::new(MemoryStore::with_prefixes(
                Arc::new(SystemClock),
                &config.redis.key_prefix,
                &config.redis.lease_prefix,
            ));

            let sweeper = store.clone();
            let every = Duration::from_secs(config.store.sweep_interval_secs);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(every);
                loop {
                    ticker.tick().await;
                    sweeper.cleanup_expired();
                }
            });

            build_state(store, &config)
        }
    };

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let app = router(state)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid));

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
