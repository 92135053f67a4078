//! Streamgate delivery
//!
//! The HLS manifest rewriting and segment delivery core: the key resolver maps
//! a request onto object-store keys, the playlist rewriter points variant references
//! back at gateway routes and segment references at either a signed object-store
//! URL or a same-origin proxy route, and the
//! gateway ties validation, catalog, access gate, signer and fetcher together.

pub mod fetcher;
pub mod gateway;
pub mod keys;
pub mod playlist;
pub mod signer;
mod upstream;

pub use fetcher::{FetchedSegment, SegmentFetcher};
pub use gateway::{DeliverySettings, Gateway, GatewayResponse, RouteFamily, StreamRequest};
pub use keys::{resolve, KeySource};
pub use playlist::{rewrite_playlist, LineTransformer, ProxyTransformer, SignedUrlTransformer};
pub use signer::Signer;
