use std::{
    error::Error,
    future::Future,
    io::{self, Write},
    net::SocketAddr,
};

use log::{error, info};
use recipe_api::{
    config::Config,
    pool::{migrate, wait_for_database},
    routes::app,
    state::AppState,
};

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// Resolves once `signal` fires. A signal that cannot be listened for
/// never resolves, so the server keeps running without graceful shutdown.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logger();

    let config = Config::load()?;
    info!("Starting with {config:?}");

    let pool = wait_for_database(&config).await?;
    migrate(&pool).await?;

    tokio::fs::create_dir_all(&config.media_root).await?;
    info!("Serving media from {}", config.media_root.display());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(pool.clone(), config)?;

    let (addr, server) =
        warp::serve(app(&state)).try_bind_with_graceful_shutdown(addr, shutdown_on(tokio::signal::ctrl_c()))?;
    info!("Listening on http://{addr}");

    server.await;
    pool.close().await;

    Ok(())
}
