//! Veritrace server entry point
//!
//! Composition root: loads config, initializes logging, opens the store,
//! migrates the schema and serves the gateway. All components hold an
//! injected store handle owned here.

use std::sync::Arc;

use veritrace::api::{self, AppState};
use veritrace::config::AppConfig;
use veritrace::logging::init_logging;
use veritrace::store::Database;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Ensure the parent directory of a file-backed database exists
fn ensure_db_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    tracing::info!(env = %env, version = env!("GIT_HASH"), "Starting veritrace");

    ensure_db_dir(&config.database.url)?;
    let db = Arc::new(Database::connect(&config.database.url).await?);
    veritrace::store::migrate(db.pool()).await?;

    #[cfg(feature = "demo-seed")]
    veritrace::store::seed::seed_demo(db.pool()).await?;

    let state = Arc::new(AppState::new(db, &config));
    api::serve(state, &config.server.host, config.server.port).await
}
