mod memory;
mod postgres;

pub use memory::InMemoryCatalog;
pub use postgres::{setup_pool, PgVideoCatalog};
