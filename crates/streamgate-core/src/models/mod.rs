//! Domain models
//!
//! Videos are owned by the catalog; keys, signed URLs and request shapes are
//! per-request values the gateway derives from them.

pub mod stream;
pub mod video;

pub use stream::{ObjectKey, Principal, RequestShape, SignedUrl};
pub use video::VideoRecord;
