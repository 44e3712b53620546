//! Subcommand dispatch: wires parsed CLI args through `hookshot-config`'s
//! layering into the server, client, and JSON-API call sites.

use anyhow::{Context, Result};
use hookshot_client::run_client_loop;
use hookshot_config::{load_config_file, resolve_client, resolve_server, Cli, Command};

use crate::display;

pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Server(args) => {
            let file = load_config_file(args.config.as_deref()).context("loading config file")?;
            let options = resolve_server(&args, &file);
            hookshot_server::run(options).await.map_err(|err| anyhow::anyhow!("{err}"))?;
            Ok(())
        }
        Command::Client(args) => {
            let file = load_config_file(args.config.as_deref()).context("loading config file")?;
            let options = resolve_client(&args, &file);
            if options.server_url.is_empty() {
                anyhow::bail!("--server is required (or set client.server in the config file)");
            }
            if args.tui {
                crate::tui::run(options).await
            } else {
                run_client_loop(options).await;
                Ok(())
            }
        }
        Command::Requests(args) => requests(args).await,
        Command::Replay(args) => replay(args).await,
    }
}

async fn requests(args: hookshot_config::RequestsArgs) -> Result<()> {
    let client = reqwest::Client::new();
    let mut request = client.get(format!("{}/api/tunnels/{}/requests", args.server, args.tunnel));
    if let Some(token) = &args.token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await.context("calling the requests endpoint")?;
    if !response.status().is_success() {
        anyhow::bail!("server returned {}", response.status());
    }
    let summaries: Vec<display::RequestSummary> = response.json().await.context("parsing requests response")?;
    display::print_requests_table(&summaries);
    Ok(())
}

async fn replay(args: hookshot_config::ReplayArgs) -> Result<()> {
    let client = reqwest::Client::new();
    let mut request = client.post(format!(
        "{}/api/tunnels/{}/requests/{}/replay",
        args.server, args.tunnel, args.request
    ));
    if let Some(token) = &args.token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await.context("calling the replay endpoint")?;
    if !response.status().is_success() {
        anyhow::bail!("server returned {}", response.status());
    }
    let result: display::ReplayResult = response.json().await.context("parsing replay response")?;
    display::print_replay_result(&result);
    Ok(())
}
