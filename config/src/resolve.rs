//! Config-file search path and CLI/file layering (`spec.md` §6
//! "Configuration file"): a flag value wins whenever the flag was given;
//! otherwise the file's value is used; otherwise the built-in default.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use hookshot_client::ClientOptions;
use hookshot_server::{ServerOptions, TlsOptions};

use crate::file::FileConfig;
use crate::ServerArgs;

/// Search path, in order, when `--config` was not given (`spec.md` §6).
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("hookshot.yaml"), PathBuf::from("hookshot.yml")];
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        paths.push(home.join(".config/hookshot/config.yaml"));
        paths.push(home.join(".hookshot.yaml"));
    }
    paths
}

/// Load the config file at `explicit` if given, else the first existing
/// path from [`default_config_paths`]. Returns an empty (all-default)
/// config when nothing is found — a missing config file is not an error.
pub fn load_config_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_paths().into_iter().find(|p| p.exists()),
    };

    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: serde_yaml::Error },
}

/// Layer `args` over `file.server`, then over the built-in defaults.
pub fn resolve_server(args: &ServerArgs, file: &FileConfig) -> ServerOptions {
    let defaults = ServerOptions::default();
    let host: IpAddr = args
        .host
        .or(file.server.host)
        .unwrap_or(defaults.host);
    let tls = match (
        args.tls_cert.clone().or_else(|| file.server.tls_cert.clone()),
        args.tls_key.clone().or_else(|| file.server.tls_key.clone()),
    ) {
        (Some(cert_path), Some(key_path)) => Some(TlsOptions { cert_path, key_path }),
        _ => None,
    };

    ServerOptions {
        host,
        port: args.port.or(file.server.port).unwrap_or(defaults.port),
        public_url_prefix: args
            .public_url
            .clone()
            .or_else(|| file.server.public_url.clone())
            .unwrap_or(defaults.public_url_prefix),
        max_requests: args.max_requests.or(file.server.max_requests).unwrap_or(defaults.max_requests),
        token: args.token.clone().or_else(|| file.server.token.clone()),
        tls,
        ..defaults
    }
}

/// Layer `args` over `file.client`, then over the built-in defaults.
pub fn resolve_client(args: &crate::ClientArgs, file: &FileConfig) -> ClientOptions {
    let server_url = args
        .server
        .clone()
        .or_else(|| file.client.server.clone())
        .unwrap_or_default();
    let default_target = args
        .target
        .clone()
        .or_else(|| file.client.target.clone())
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    let mut options = ClientOptions::new(server_url, default_target);
    options.requested_id = args.id.clone().or_else(|| file.client.id.clone());
    options.token = args.token.clone().or_else(|| file.client.token.clone());
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientArgs, ServerArgs};

    #[test]
    fn flag_wins_over_file_value() {
        let args = ServerArgs {
            port: Some(9999),
            ..Default::default()
        };
        let mut file = FileConfig::default();
        file.server.port = Some(1111);
        let resolved = resolve_server(&args, &file);
        assert_eq!(resolved.port, 9999);
    }

    #[test]
    fn file_value_applies_when_flag_not_given() {
        let args = ServerArgs::default();
        let mut file = FileConfig::default();
        file.server.port = Some(1111);
        let resolved = resolve_server(&args, &file);
        assert_eq!(resolved.port, 1111);
    }

    #[test]
    fn default_applies_when_neither_flag_nor_file_set_it() {
        let args = ServerArgs::default();
        let file = FileConfig::default();
        let resolved = resolve_server(&args, &file);
        assert_eq!(resolved.port, ServerOptions::default().port);
    }

    #[test]
    fn load_config_file_reads_an_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hookshot.yaml");
        std::fs::write(&path, "server:\n  port: 4242\n").unwrap();

        let config = load_config_file(Some(&path)).unwrap();
        assert_eq!(config.server.port, Some(4242));
    }

    #[test]
    fn load_config_file_defaults_when_nothing_exists() {
        let explicit = PathBuf::from("/definitely/does/not/exist.yaml");
        assert!(load_config_file(Some(&explicit)).is_err());
    }

    #[test]
    fn client_defaults_target_when_unset() {
        let args = ClientArgs {
            server: Some("http://localhost:8080".to_string()),
            ..Default::default()
        };
        let file = FileConfig::default();
        let resolved = resolve_client(&args, &file);
        assert_eq!(resolved.default_target, "http://localhost:3000");
        assert_eq!(resolved.server_url, "http://localhost:8080");
    }
}
