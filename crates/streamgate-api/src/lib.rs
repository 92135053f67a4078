//! HTTP surface of the streamgate HLS gateway.
//!
//! Exposed as a library so integration tests can build the real router.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod principal;
pub mod setup;
pub mod state;
