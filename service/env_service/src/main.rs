use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use delivery_env::register_default_env as register_delivery;
use env_service::make_app;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "env_service", about = "HTTP front for the grid delivery environment")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    // Pre-register environments for /envs and factory-based init
    register_delivery();
    let app = make_app();

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;
    tracing::info!(addr = %args.addr, "environment service listening");
    axum::serve(listener, app).await.context("serving http")?;
    Ok(())
}
