//! CLI parsing and config-file layering for the `hookshot` binary
//! (`spec.md` §6 "External interfaces").
//!
//! The CLI struct's fields are all `Option<T>` so that "not given on the
//! command line" is distinguishable from "given, and equal to the
//! default" — a flag's value wins over a config-file value only when the
//! flag was actually supplied (`spec.md` §6 "Configuration file").

mod file;
mod resolve;

pub use file::{ClientFileConfig, FileConfig, ServerFileConfig};
pub use resolve::{default_config_paths, load_config_file, resolve_client, resolve_server};

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hookshot", version, about = "Self-hostable webhook relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the relay server.
    Server(ServerArgs),
    /// Run the relay client, tunneling webhooks to a local target.
    Client(ClientArgs),
    /// List requests recorded by a tunnel.
    Requests(RequestsArgs),
    /// Replay a previously recorded request.
    Replay(ReplayArgs),
}

#[derive(Debug, Clone, Parser, Default)]
pub struct ServerArgs {
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub host: Option<IpAddr>,
    #[arg(long)]
    pub public_url: Option<String>,
    #[arg(long)]
    pub max_requests: Option<usize>,
    #[arg(long, env = "HOOKSHOT_TOKEN")]
    pub token: Option<String>,
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Parser, Default)]
pub struct ClientArgs {
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long)]
    pub target: Option<String>,
    /// Advisory only — the server always assigns its own tunnel id (`spec.md` §9).
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long, env = "HOOKSHOT_TOKEN")]
    pub token: Option<String>,
    #[arg(long)]
    pub verbose: bool,
    #[arg(long)]
    pub tui: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
pub struct RequestsArgs {
    #[arg(long)]
    pub server: String,
    #[arg(long)]
    pub tunnel: String,
    #[arg(long, env = "HOOKSHOT_TOKEN")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Parser)]
pub struct ReplayArgs {
    #[arg(long)]
    pub server: String,
    #[arg(long)]
    pub tunnel: String,
    #[arg(long)]
    pub request: String,
    #[arg(long, env = "HOOKSHOT_TOKEN")]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_subcommand_parses_flags() {
        let cli = Cli::parse_from([
            "hookshot",
            "server",
            "--port",
            "9000",
            "--token",
            "secret",
        ]);
        let Command::Server(args) = cli.command else {
            panic!("expected server subcommand");
        };
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.token.as_deref(), Some("secret"));
        assert_eq!(args.host, None);
    }

    #[test]
    fn client_subcommand_requires_server() {
        let result = Cli::try_parse_from(["hookshot", "client"]);
        assert!(result.is_err());
    }

    #[test]
    fn replay_subcommand_parses_all_flags() {
        let cli = Cli::parse_from([
            "hookshot",
            "replay",
            "--server",
            "http://localhost:8080",
            "--tunnel",
            "abc",
            "--request",
            "def",
        ]);
        let Command::Replay(args) = cli.command else {
            panic!("expected replay subcommand");
        };
        assert_eq!(args.server, "http://localhost:8080");
        assert_eq!(args.tunnel, "abc");
        assert_eq!(args.request, "def");
    }
}
