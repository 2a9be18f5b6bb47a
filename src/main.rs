use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use medcrm::{auth::jwt::JwtService, cleanup, config::AppConfig, db, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "api",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        "loaded backend configuration"
    );

    let pool = db::init_pool(&config.database_url, config.database_max_pool_size)?;
    let jwt = JwtService::from_config(&config)?;
    let addr = SocketAddr::new(config.server_host.parse()?, config.server_port);
    let cleanup_interval = Duration::from_secs(config.token_cleanup_interval_hours * 60 * 60);

    let state = AppState::new(pool, config, jwt);

    tokio::spawn(cleanup::run(state.pool.clone(), cleanup_interval));

    let app = routes::create_router(state).layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "api server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
