//! Atlas Gateway - HTTP query service with background memory expiry.

use clap::Parser;
use std::net::SocketAddr;
use tokio::sync::watch;
use tracing::{error, info};

use atlas::agent::Agent;
use atlas::config::Config;
use atlas::gateway::{self, AppState};
use atlas::memory;
use atlas::sweeper::ExpirySweeper;

#[derive(Parser)]
#[command(name = "atlas-gateway", version = atlas::VERSION, about = "Atlas HTTP query service")]
struct Args {
    /// Bind address (overrides gateway.bind)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides gateway.port)
    #[arg(long, short)]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sqlx=warn".into());

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json);

    let mut config = Config::from_env()?;
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    info!("Starting Atlas gateway v{}", atlas::VERSION);

    let store = memory::open(&config).await?;
    let agent = Agent::from_config(&config, store.clone())?;
    let state = AppState::new(agent);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = tokio::spawn(ExpirySweeper::new(store).run(shutdown_rx));

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    gateway::serve(listener, state, async move {
        wait_for_ctrl_c().await;
        let _ = shutdown_tx.send(true);
    })
    .await?;

    sweeper.await?;
    info!("Atlas gateway stopped");
    Ok(())
}
