//! Catalog initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use streamgate_core::{Catalog, CatalogBackend, Config};
use streamgate_db::{setup_pool, InMemoryCatalog, PgVideoCatalog};

pub async fn setup_catalog(config: &Config) -> Result<Arc<dyn Catalog>> {
    match config.catalog_backend() {
        CatalogBackend::Postgres => {
            let pool = setup_pool(config)
                .await
                .context("Failed to connect to catalog database")?;
            tracing::info!("Postgres catalog ready");
            Ok(Arc::new(PgVideoCatalog::new(pool)))
        }
        CatalogBackend::Memory => {
            let catalog = match config.catalog_seed_path() {
                Some(path) => InMemoryCatalog::from_seed_file(path)
                    .await
                    .with_context(|| format!("Failed to load catalog seed from {}", path))?,
                None => InMemoryCatalog::new(),
            };
            tracing::info!(videos = catalog.len(), "In-memory catalog ready");
            Ok(Arc::new(catalog))
        }
    }
}
