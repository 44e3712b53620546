//! The YAML config-file schema (`spec.md` §6 "Configuration file"): two
//! top-level sections, `server` and `client`, mirroring the CLI flags.
//! Every field is optional — a config file may set as few or as many
//! values as it likes, and unset ones simply fall through to defaults.

use std::net::IpAddr;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub client: ClientFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,
    pub host: Option<IpAddr>,
    pub public_url: Option<String>,
    pub max_requests: Option<usize>,
    pub token: Option<String>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientFileConfig {
    pub server: Option<String>,
    pub target: Option<String>,
    pub id: Option<String>,
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_sections_with_partial_fields() {
        let yaml = r#"
server:
  port: 9090
  token: secret
client:
  target: http://localhost:4000
"#;
        let config: FileConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, Some(9090));
        assert_eq!(config.server.host, None);
        assert_eq!(config.client.target.as_deref(), Some("http://localhost:4000"));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let config: FileConfig = serde_yaml::from_str("server:\n  port: 1234\n").unwrap();
        assert_eq!(config.server.port, Some(1234));
        assert_eq!(config.client.server, None);
    }
}
