use std::{str::FromStr, time::Duration};

use log::{info, warn};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::config::Config;

const WAIT_INTERVAL: Duration = Duration::from_secs(1);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the service database. WAL lets readers run beside the single
/// writer, and writers wait out each other's locks for `BUSY_TIMEOUT`.
pub async fn connect(url: &str, max_connections: u32) -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// A private database that lives as long as the returned pool.
pub async fn connect_memory() -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Blocks startup until the store accepts connections, retrying every second.
pub async fn wait_for_database(config: &Config) -> Result<Pool<Sqlite>, sqlx::Error> {
    info!("Waiting for database...");
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match connect(&config.database_url, config.database_max_connections).await {
            Ok(pool) => {
                info!("Database available.");
                return Ok(pool);
            }
            Err(e) => {
                if config.database_wait_attempts != 0 && attempt >= config.database_wait_attempts {
                    return Err(e);
                }
                warn!("Database unavailable ({e}), waiting 1 second...");
                tokio::time::sleep(WAIT_INTERVAL).await;
            }
        }
    }
}

pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Migrations applied.");

    Ok(())
}
