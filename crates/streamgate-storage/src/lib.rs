//! Streamgate Storage Library
//!
//! Read-side object-store capability for the gateway: fetch an object (streamed or
//! whole) together with its content type, and issue time-limited signed URLs.
//! Backends: S3 and S3-compatible stores through `object_store`, the local
//! filesystem, and a process-local map used by tests.
//!
//! # Key format
//!
//! Keys are the object-store paths of HLS artifacts, e.g.
//! `videos/{id}/master.m3u8` or `videos/{id}/720p/seg_001.ts`. Keys must not
//! contain a `..` segment or a leading `/`; every backend rejects them with
//! `StorageError::InvalidKey`.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use streamgate_core::StorageBackend;
pub use traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
