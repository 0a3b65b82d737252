//! Push relay client.
//!
//! Optional env: RELAY_WS_URL, RELAY_URL

use std::env;

use clap::Parser;
use client::{cli, relay_client};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let ws_url = env::var("RELAY_WS_URL").unwrap_or_else(|_| "ws://localhost:8080/ws".to_string());

    match cli.command.unwrap_or(cli::Commands::Listen) {
        cli::Commands::Listen => relay_client::run_listen(&ws_url).await?,
        cli::Commands::Send { message, json } => {
            relay_client::run_send(&ws_url, &message, json).await?
        }
        cli::Commands::Chat => relay_client::run_chat(&ws_url).await?,
        cli::Commands::Init => {
            let relay_url =
                env::var("RELAY_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
            let client = reqwest::Client::new();
            let res = client
                .post(format!("{}/admin/init", relay_url.trim_end_matches('/')))
                .send()
                .await?;
            if !res.status().is_success() {
                let err: String = res.text().await.unwrap_or_default();
                anyhow::bail!("Init failed: {}", err);
            }
            println!("{}", res.text().await?);
        }
    }

    Ok(())
}
