//! # Hookshot core
//!
//! The tunnel substrate shared by the relay server: the request store,
//! the `Tunnel` type, and the process-wide `TunnelRegistry`. Everything
//! here is transport-agnostic — neither axum nor tokio-tungstenite types
//! appear in this crate; the server and client crates drive actual socket
//! I/O and call into these types.

pub mod error;
pub mod registry;
pub mod store;
pub mod tunnel;

pub use error::CoreError;
pub use registry::TunnelRegistry;
pub use store::{RequestStore, RequestSummary, StoredRequest, StoredResponse};
pub use tunnel::Tunnel;
