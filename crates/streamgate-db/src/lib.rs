//! Streamgate catalog implementations
//!
//! `PgVideoCatalog` reads the `videos` table of an existing Postgres catalog;
//! `InMemoryCatalog` keeps records in process, seeded from a JSON file.

pub mod catalog;

pub use catalog::{setup_pool, InMemoryCatalog, PgVideoCatalog};
