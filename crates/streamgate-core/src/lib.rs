//! Streamgate Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and
//! validation shared by every Streamgate component, plus the collaborator traits
//! (`Catalog`, `AccessGate`) the gateway consumes without owning.

pub mod access;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use access::{AccessDecision, AccessGate, AllowAll, DenyAll};
pub use catalog::Catalog;
pub use config::{BaseConfig, CatalogBackend, Config, GatewayConfig, SegmentDelivery};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ObjectKey, Principal, RequestShape, SignedUrl, VideoRecord};
pub use storage_types::StorageBackend;
