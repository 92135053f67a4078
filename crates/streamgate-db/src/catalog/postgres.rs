use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use streamgate_core::{AppError, Catalog, Config, VideoRecord};

/// Connect to the catalog database.
///
/// The gateway only reads the catalog, so no migrations run here.
pub async fn setup_pool(config: &Config) -> anyhow::Result<PgPool> {
    let url = config
        .database_url()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for the postgres catalog"))?;

    tracing::info!("Connecting to catalog database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(url)
        .await?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Catalog database connected successfully"
    );

    Ok(pool)
}

/// Catalog backed by the `videos` table.
#[derive(Clone)]
pub struct PgVideoCatalog {
    pool: PgPool,
}

impl PgVideoCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Catalog for PgVideoCatalog {
    #[tracing::instrument(skip(self), fields(db.table = "videos"))]
    async fn get_video_by_logical_id(&self, id: &str) -> Result<Option<VideoRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            SELECT id, video_url, course_id, title, duration, thumbnail_url
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
