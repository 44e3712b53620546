use std::sync::Arc;

use hookshot_core::TunnelRegistry;

use crate::options::ServerOptions;

/// Shared state cloned into every Axum handler. Cheap to clone: both
/// fields are `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TunnelRegistry>,
    pub options: Arc<ServerOptions>,
}

impl AppState {
    pub fn new(options: ServerOptions) -> Self {
        let registry = TunnelRegistry::new(options.max_requests);
        Self {
            registry,
            options: Arc::new(options),
        }
    }
}

/// 8-hex-character random correlator, unique within a tunnel's retention
/// window with overwhelming probability (`spec.md` §3).
pub fn short_request_id() -> String {
    let mut bytes = [0u8; 4];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
