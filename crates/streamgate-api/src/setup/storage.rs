//! Object store initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use streamgate_core::Config;
use streamgate_storage::{create_storage, Storage};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize object store")?;

    tracing::info!(
        backend = %storage.backend_type(),
        timeout_secs = config.storage_timeout().as_secs(),
        "Object store ready"
    );

    Ok(storage)
}
