use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// 10 MiB — the default cap on both the WebSocket max message size and
/// the webhook ingress body size (`spec.md` §4.5, §6).
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

pub const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(10);
pub const WRITE_DEADLINE: Duration = Duration::from_secs(10);
pub const PONG_WAIT: Duration = Duration::from_secs(60);
pub const WEBHOOK_DEADLINE: Duration = Duration::from_secs(30);
pub const SHUTDOWN_DRAIN: Duration = Duration::from_secs(10);

/// `ping_period` = 9/10 of `pong_wait` (`spec.md` §4.3, §4.7).
pub fn ping_period() -> Duration {
    Duration::from_secs_f64(PONG_WAIT.as_secs_f64() * 0.9)
}

#[derive(Debug, Clone)]
pub struct TlsOptions {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Everything the relay server needs to start. Built by `hookshot-config`
/// from CLI flags and the YAML config file; kept plain here so the server
/// crate has no dependency on `clap` or `serde_yaml`.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: IpAddr,
    pub port: u16,
    pub public_url_prefix: String,
    pub max_requests: usize,
    pub token: Option<String>,
    pub max_message_size: usize,
    pub max_body_size: usize,
    pub allowed_origins: Vec<String>,
    pub tls: Option<TlsOptions>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
            public_url_prefix: "http://localhost:8080".to_string(),
            max_requests: 100,
            token: None,
            max_message_size: DEFAULT_MAX_BYTES,
            max_body_size: DEFAULT_MAX_BYTES,
            allowed_origins: Vec::new(),
            tls: None,
        }
    }
}
