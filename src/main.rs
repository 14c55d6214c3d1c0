use clap::Parser;
use color_eyre::eyre::Result;
use crash_client::config::{
    AppConfig,
    Args,
};

mod client;
mod ui;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = AppConfig::try_from(Args::parse())?;
    let _log_guard = client::init_tracing(&config)?;
    tracing::info!(url = %config.server_url, "starting crash client");
    client::run_app(config).await
}
