mod config;
mod demo;

use clap::Parser;
use config::{Cli, OutputFormat};
use ghostbridge::Bridge;
use ghostbridge_client::Bootstrap;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the bootstrap values.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level)?)
        .with_writer(std::io::stderr)
        .init();

    let bridge = Bridge::new(demo::router())?;
    let bootstrap = Bootstrap::new(bridge.port(), bridge.cert(), bridge.token());
    println!("{}", render(&bootstrap, cli.format)?);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupted, shutting down");
    bridge.close().await?;

    Ok(())
}

fn render(bootstrap: &Bootstrap, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(bootstrap)?,
        OutputFormat::Text => format!(
            "port: {}\ntoken: {}\n{}",
            bootstrap.port,
            bootstrap.token,
            bootstrap.cert.trim_end()
        ),
    })
}
