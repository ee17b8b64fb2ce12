use denuncias::config::Config;
use denuncias::db::resolver::{self, PgProbe, Resolution};
use denuncias::db::DenunciaStore;
use mimalloc::MiMalloc;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.default_filter()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let resolved =
        resolver::resolve(cfg.external_database_url(), &cfg.base_dir, &PgProbe::default()).await;

    info!(
        backend = resolved.backend.as_str(),
        resolution = resolved.resolution.as_str(),
        degraded = resolved.resolution.is_degraded(),
        database_url = %resolved.redacted_url(),
        app_env = ?cfg.app_env,
        "database resolved"
    );
    if let Resolution::Fallback { reason } = &resolved.resolution {
        warn!(reason = %reason, "serving from local database instead of DATABASE_URL");
    }

    let (store, resolution) = DenunciaStore::open(resolved, &cfg.base_dir)?;

    if let Err(e) = store.init_schema().await {
        error!(error = %e, "database schema initialization failed; continuing");
    }

    let state = denuncias::router::AppState::new(store, resolution);
    let app = denuncias::router::denuncias_router(state);

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
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
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
