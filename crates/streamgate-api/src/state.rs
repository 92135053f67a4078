//! Application state shared by every handler.

use std::sync::Arc;
use streamgate_core::{Catalog, Config};
use streamgate_delivery::Gateway;
use streamgate_storage::Storage;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub config: Config,
    pub gateway: Gateway,
    /// Kept beside the gateway for health probes.
    pub catalog: Arc<dyn Catalog>,
    pub storage: Arc<dyn Storage>,
    /// Cancelled when the server stops; background tasks watch it.
    pub shutdown: CancellationToken,
}
