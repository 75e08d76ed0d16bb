//! Runs the HTTP broker: private mailboxes, a public board, and the
//! trusted dealer, all behind one axum server.

use clap::Parser;
use mpc_api::broker::{router, BrokerState};
use mpc_api::field::DEFAULT_MODULUS;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "HTTP broker for a secure multi-party computation run")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Field modulus p, handed to the dealer for triple generation.
    #[arg(long, default_value_t = DEFAULT_MODULUS)]
    modulus: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let state = BrokerState::new(args.modulus);
    let app = router(state);

    tracing::info!(%addr, modulus = args.modulus, "broker listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
