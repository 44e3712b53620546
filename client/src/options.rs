//! Everything the relay client needs to start. Built by `hookshot-config`
//! from CLI flags and the YAML config file; kept plain here so this crate
//! has no dependency on `clap` or `serde_yaml`, mirroring how
//! `hookshot-server::ServerOptions` is built.

use std::time::Duration;

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const OUTBOUND_DEADLINE: Duration = Duration::from_secs(30);
pub const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(10);
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// A route table entry: requests whose path starts with `path_prefix` are
/// forwarded to `target` instead of the default (`spec.md` §4.6 "Route
/// resolution"). The CLI surface exposes only a single default target;
/// additional routes are a hook for embedders of this crate.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path_prefix: String,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub server_url: String,
    pub default_target: String,
    pub routes: Vec<RouteEntry>,
    /// Advisory only — the server always assigns its own tunnel id (`spec.md` §9).
    pub requested_id: Option<String>,
    pub token: Option<String>,
}

impl ClientOptions {
    pub fn new(server_url: impl Into<String>, default_target: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            default_target: default_target.into(),
            routes: Vec::new(),
            requested_id: None,
            token: None,
        }
    }
}
