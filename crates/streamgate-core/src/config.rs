//! Configuration module
//!
//! Gateway settings are read from the environment (after loading an optional
//! `.env` file) and validated once at startup. Handlers read them through the
//! getters on `Config`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_PLAYLIST_MAX_AGE_SECS, DEFAULT_PROCESSED_PREFIX, DEFAULT_SEGMENT_CONTENT_TYPE,
    DEFAULT_SEGMENT_EXTENSION, DEFAULT_SEGMENT_MAX_AGE_SECS,
};
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_RATE_LIMIT_PER_MINUTE: u32 = 600;
const RATE_LIMITER_SHARD_COUNT: usize = 16;
const RATE_LIMIT_SWEEP_INTERVAL_SECS: u64 = 300;
const TRUSTED_PROXY_COUNT: usize = 1;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const STORAGE_TIMEOUT_SECS: u64 = 30;
const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Which catalog implementation backs video lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    Postgres,
    Memory,
}

impl FromStr for CatalogBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(CatalogBackend::Postgres),
            "memory" => Ok(CatalogBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid catalog backend: {}", s)),
        }
    }
}

/// How the unified query route answers SEGMENT requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentDelivery {
    /// Fetch the segment and stream it through the gateway.
    Proxy,
    /// Answer with a temporary redirect to a signed object-store URL.
    Redirect,
}

impl FromStr for SegmentDelivery {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proxy" => Ok(SegmentDelivery::Proxy),
            "redirect" => Ok(SegmentDelivery::Redirect),
            _ => Err(anyhow::anyhow!("Invalid segment delivery mode: {}", s)),
        }
    }
}

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub http_rate_limit_per_minute: u32,
    pub rate_limiter_shard_count: usize,
    pub rate_limit_sweep_interval_secs: u64,
    pub trusted_proxy_count: usize,
    pub http_concurrency_limit: usize,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            http_rate_limit_per_minute: HTTP_RATE_LIMIT_PER_MINUTE,
            rate_limiter_shard_count: RATE_LIMITER_SHARD_COUNT,
            rate_limit_sweep_interval_secs: RATE_LIMIT_SWEEP_INTERVAL_SECS,
            trusted_proxy_count: TRUSTED_PROXY_COUNT,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
        }
    }
}

/// Gateway configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO, R2, Spaces)
    pub aws_region: Option<String>,
    pub storage_timeout_secs: u64,
    pub local_storage_path: Option<String>,
    // Catalog configuration
    pub catalog_backend: CatalogBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub catalog_seed_path: Option<String>,
    // Delivery configuration
    pub signed_url_ttl_secs: u64,
    pub playlist_cache_max_age_secs: u64,
    pub segment_cache_max_age_secs: u64,
    pub segment_extension: String,
    pub segment_content_type: String,
    pub allowed_qualities: Vec<String>,
    pub segment_delivery: SegmentDelivery,
    pub processed_video_prefix: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            storage_backend: StorageBackend::S3,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            storage_timeout_secs: STORAGE_TIMEOUT_SECS,
            local_storage_path: None,
            catalog_backend: CatalogBackend::Postgres,
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            catalog_seed_path: None,
            signed_url_ttl_secs: SIGNED_URL_TTL_SECS,
            playlist_cache_max_age_secs: DEFAULT_PLAYLIST_MAX_AGE_SECS,
            segment_cache_max_age_secs: DEFAULT_SEGMENT_MAX_AGE_SECS,
            segment_extension: DEFAULT_SEGMENT_EXTENSION.to_string(),
            segment_content_type: DEFAULT_SEGMENT_CONTENT_TYPE.to_string(),
            allowed_qualities: Vec::new(),
            segment_delivery: SegmentDelivery::Proxy,
            processed_video_prefix: DEFAULT_PROCESSED_PREFIX.to_string(),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: lookup("PORT")
                .unwrap_or_else(|| "4000".to_string())
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            http_rate_limit_per_minute: parse_or(
                lookup("HTTP_RATE_LIMIT_PER_MINUTE"),
                HTTP_RATE_LIMIT_PER_MINUTE,
            ),
            rate_limiter_shard_count: parse_or(
                lookup("RATE_LIMITER_SHARD_COUNT"),
                RATE_LIMITER_SHARD_COUNT,
            ),
            rate_limit_sweep_interval_secs: parse_or(
                lookup("RATE_LIMIT_SWEEP_INTERVAL_SECS"),
                RATE_LIMIT_SWEEP_INTERVAL_SECS,
            ),
            trusted_proxy_count: parse_or(lookup("TRUSTED_PROXY_COUNT"), TRUSTED_PROXY_COUNT),
            http_concurrency_limit: parse_or(
                lookup("HTTP_CONCURRENCY_LIMIT"),
                HTTP_CONCURRENCY_LIMIT,
            ),
        };

        let storage_backend = match non_empty(lookup("STORAGE_BACKEND")) {
            Some(s) => s.parse()?,
            None => StorageBackend::S3,
        };
        let catalog_backend = match non_empty(lookup("CATALOG_BACKEND")) {
            Some(s) => s.parse()?,
            None => CatalogBackend::Postgres,
        };
        let segment_delivery = match non_empty(lookup("HLS_SEGMENT_DELIVERY")) {
            Some(s) => s.parse()?,
            None => SegmentDelivery::Proxy,
        };

        let allowed_qualities = lookup("HLS_ALLOWED_QUALITIES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = GatewayConfig {
            base,
            storage_backend,
            s3_bucket: non_empty(lookup("S3_BUCKET")),
            s3_region: non_empty(lookup("S3_REGION")),
            s3_endpoint: non_empty(lookup("S3_ENDPOINT")),
            aws_region: non_empty(lookup("AWS_REGION")),
            storage_timeout_secs: parse_or(lookup("STORAGE_TIMEOUT_SECS"), STORAGE_TIMEOUT_SECS),
            local_storage_path: non_empty(lookup("LOCAL_STORAGE_PATH")),
            catalog_backend,
            database_url: non_empty(lookup("DATABASE_URL")),
            db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(lookup("DB_TIMEOUT_SECONDS"), CONNECTION_TIMEOUT_SECS),
            catalog_seed_path: non_empty(lookup("CATALOG_SEED_PATH")),
            signed_url_ttl_secs: parse_or(lookup("SIGNED_URL_TTL_SECS"), SIGNED_URL_TTL_SECS),
            playlist_cache_max_age_secs: parse_or(
                lookup("PLAYLIST_CACHE_MAX_AGE_SECS"),
                DEFAULT_PLAYLIST_MAX_AGE_SECS,
            ),
            segment_cache_max_age_secs: parse_or(
                lookup("SEGMENT_CACHE_MAX_AGE_SECS"),
                DEFAULT_SEGMENT_MAX_AGE_SECS,
            ),
            segment_extension: non_empty(lookup("HLS_SEGMENT_EXTENSION"))
                .unwrap_or_else(|| DEFAULT_SEGMENT_EXTENSION.to_string()),
            segment_content_type: non_empty(lookup("HLS_SEGMENT_CONTENT_TYPE"))
                .unwrap_or_else(|| DEFAULT_SEGMENT_CONTENT_TYPE.to_string()),
            allowed_qualities,
            segment_delivery,
            processed_video_prefix: non_empty(lookup("PROCESSED_VIDEO_PREFIX"))
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_PROCESSED_PREFIX.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.base.http_rate_limit_per_minute == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_RATE_LIMIT_PER_MINUTE must be greater than 0"
            ));
        }

        if self.base.rate_limiter_shard_count == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMITER_SHARD_COUNT must be greater than 0"
            ));
        }

        if self.base.rate_limit_sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMIT_SWEEP_INTERVAL_SECS must be greater than 0"
            ));
        }

        if self.storage_timeout_secs == 0 {
            return Err(anyhow::anyhow!("STORAGE_TIMEOUT_SECS must be greater than 0"));
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than 0"));
        }

        if !self.segment_extension.starts_with('.') || self.segment_extension.len() < 2 {
            return Err(anyhow::anyhow!(
                "HLS_SEGMENT_EXTENSION must look like '.ts'"
            ));
        }

        if self.processed_video_prefix.is_empty() || self.processed_video_prefix.contains("..") {
            return Err(anyhow::anyhow!(
                "PROCESSED_VIDEO_PREFIX must be a non-empty key prefix without '..'"
            ));
        }

        match self.catalog_backend {
            CatalogBackend::Postgres => match &self.database_url {
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when using the postgres catalog"
                    ))
                }
                Some(url)
                    if !url.starts_with("postgres://") && !url.starts_with("postgresql://") =>
                {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                Some(_) => {}
            },
            CatalogBackend::Memory => {}
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BACKEND=memory is not allowed in production"
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GatewayConfig>);

impl Config {
    pub fn new(config: GatewayConfig) -> Self {
        Config(Box::new(config))
    }

    fn inner(&self) -> &GatewayConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config::new(GatewayConfig::from_env()?))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        self.inner().is_production()
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn http_rate_limit_per_minute(&self) -> u32 {
        self.inner().base.http_rate_limit_per_minute
    }

    pub fn rate_limiter_shard_count(&self) -> usize {
        self.inner().base.rate_limiter_shard_count
    }

    pub fn rate_limit_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.inner().base.rate_limit_sweep_interval_secs)
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.inner().base.trusted_proxy_count
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    /// `S3_REGION`, falling back to `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.inner()
            .s3_region
            .as_deref()
            .or(self.inner().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().storage_timeout_secs)
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn catalog_backend(&self) -> CatalogBackend {
        self.inner().catalog_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn catalog_seed_path(&self) -> Option<&str> {
        self.inner().catalog_seed_path.as_deref()
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.inner().signed_url_ttl_secs)
    }

    pub fn playlist_cache_max_age_secs(&self) -> u64 {
        self.inner().playlist_cache_max_age_secs
    }

    pub fn segment_cache_max_age_secs(&self) -> u64 {
        self.inner().segment_cache_max_age_secs
    }

    pub fn segment_extension(&self) -> &str {
        &self.inner().segment_extension
    }

    pub fn segment_content_type(&self) -> &str {
        &self.inner().segment_content_type
    }

    pub fn allowed_qualities(&self) -> &[String] {
        &self.inner().allowed_qualities
    }

    pub fn segment_delivery(&self) -> SegmentDelivery {
        self.inner().segment_delivery
    }

    pub fn processed_video_prefix(&self) -> &str {
        &self.inner().processed_video_prefix
    }
}
