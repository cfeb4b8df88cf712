use clap::Parser;

use nikogrid::api::backend::Client;
use nikogrid::config::{Config, REQUIRED_VARIABLES};

mod cli;
mod interactive;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let config = Config::env().inspect_err(|e| {
        log::error!(
            "config: {e}. Check all required environment variables ({}) are set.",
            REQUIRED_VARIABLES.join(", ")
        );
    })?;

    config.log();

    let mut client = Client::new(&config.backend_url, config.http_timeout)?;
    if let Some(token) = &config.auth_token {
        client = client.with_token(token);
    }
    log::info!("Using backend {} as {:?}", client.base(), client.session());

    cli::execute(args.command, &config, client).await
}
