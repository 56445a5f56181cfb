mod polling;
mod schedule;
mod shutdown;

use crate::core::clock::SystemClock;
use crate::core::credentials;
use crate::core::settings::Settings;
use crate::providers::GoogleDistanceMatrix;
use anyhow::{Context, Result};
use std::sync::Arc;

pub use polling::{Collector, CollectorConfig, RouteSet};
pub use shutdown::Shutdown;

/// Loads every configured source. Any malformed source stops startup.
pub fn load_routes(settings: &Settings) -> Result<Vec<RouteSet>> {
    settings
        .sources
        .iter()
        .map(|source| {
            RouteSet::load(settings, source)
                .with_context(|| format!("Failed to load source {:?}", source.name))
        })
        .collect()
}

pub async fn run(settings: Settings) -> Result<()> {
    tracing::info!("Starting rush-hour collector");

    settings.validate().context("Invalid configuration")?;

    let credentials = credentials::from_settings(&settings.credentials);
    let key = credentials
        .api_key()
        .with_context(|| format!("Failed to load API key from {}", credentials.describe()))?;
    tracing::info!(source = %credentials.describe(), "Loaded API key");

    let routes = load_routes(&settings)?;
    let provider = Arc::new(GoogleDistanceMatrix::new(&settings, key)?);

    let (trigger, shutdown) = Shutdown::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Stop requested, finishing current write");
            trigger.request();
        }
    });

    let mut collector = Collector::new(
        CollectorConfig::from(&settings),
        routes,
        provider,
        Arc::new(SystemClock),
        shutdown,
    );
    collector.run().await;

    Ok(())
}
