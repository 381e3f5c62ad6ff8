use mimalloc::MiMalloc;
use plugsync::catalog::ModelCatalog;
use plugsync::server::guards::auth::PluginSecret;
use plugsync::server::router::{PlugsyncState, plugsync_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = &*plugsync::config::CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let plugin_secret = PluginSecret::new(&cfg.plugin.connection_token);
    info!(
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        plugin_enabled = plugin_secret.is_configured(),
        antigravity_models_url = %cfg.catalog.antigravity_models_url.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        "Configuration loaded"
    );

    let db = plugsync::db::spawn(&cfg.basic.database_url).await?;
    let catalog = ModelCatalog::new(cfg)?;
    let panel_key: Arc<str> = Arc::from(cfg.basic.panel_key.as_str());

    let state = PlugsyncState::new(Arc::new(db), plugin_secret, panel_key, catalog);
    let app = plugsync_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
