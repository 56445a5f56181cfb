use crate::core::settings::Settings;
use crate::daemon;
use anyhow::Result;
use std::path::Path;

pub async fn run(config: Option<&Path>) -> Result<()> {
    let settings = Settings::load(config)?;
    daemon::run(settings).await
}
