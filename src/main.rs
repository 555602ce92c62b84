//! Application entry point: loads the configuration, opens the record store
//! and serves the pp API.

mod beatmaps;
mod config;
mod database;
mod difficulty;
mod server;
mod service;

use crate::beatmaps::{HttpOrigin, OsuApiLookup, ResourceFetcher, ResourceResolver};
use crate::config::ServiceConfig;
use crate::database::Database;
use crate::difficulty::OsuCalculator;
use crate::service::CacheOrchestrator;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("MAIN: Booting osu-pp-cache...");

    if let Err(e) = run().await {
        log::error!("MAIN: {}, exiting...", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::load()?;

    let db = Database::new(&config.database_path).await.map_err(|e| {
        format!(
            "Could not open database at {}: {}",
            config.database_path.display(),
            e
        )
    })?;
    log::info!(
        "MAIN: {} cached records in {}",
        db.count().await?,
        config.database_path.display()
    );

    let client = beatmaps::http_client();
    let lookup = OsuApiLookup::new(client.clone(), &config.api_base_url, &config.api_key);
    let origin = HttpOrigin::new(client, &config.origin_base_url);

    let orchestrator = CacheOrchestrator::new(
        db.clone(),
        ResourceResolver::new(lookup, db),
        ResourceFetcher::new(origin, config.beatmap_dir.clone()),
        OsuCalculator::new(),
    );

    server::serve(&config, orchestrator).await
}
