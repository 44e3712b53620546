use thiserror::Error;

/// Error kinds produced by the tunnel substrate (store, tunnel, registry).
///
/// These map onto the error taxonomy of `spec.md` §7; HTTP-facing status
/// codes are assigned by the server crate, which is the only layer that
/// knows about HTTP.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("tunnel closed")]
    TunnelClosed,
    #[error("request timed out")]
    RequestTimeout,
}
