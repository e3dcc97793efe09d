use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sogrub::config::AppConfig;
use sogrub::{app, AppState};

#[derive(Debug, Parser)]
#[command(name = "sogrub", version, about = "Sogrub storefront and admin API")]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, UPSTASH_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sogrub=info,tower_http=info")))
        .init();

    let args = Args::parse();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Sogrub API in {:?} mode", config.environment);

    let state = AppState::from_config(config)?;

    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Sogrub API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
