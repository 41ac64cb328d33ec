use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use faucet_limiter::{FileRecordStore, RateLimiter, RecordStore};
use faucet_sequencer::{Ed25519TxSigner, RestLedgerClient, Sequencer, TxSigner};
use faucet_server::{FaucetConfig, GrantCoordinator, http, telemetry};

#[derive(Debug, Parser)]
#[command(name = "drip-faucet")]
#[command(about = "Rate-limited asset faucet", version)]
struct Args {
    /// Path to the JSON config file.
    #[arg(long, short, env = "FAUCET_CONFIG", default_value = "faucet.json")]
    config: PathBuf,

    #[arg(long, default_value = "info")]
    log: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    telemetry::init(&args.log, args.json_logs)?;

    let cfg = FaucetConfig::load(&args.config)?;
    tracing::info!(config = ?cfg, "configuration loaded");

    let store = FileRecordStore::open(cfg.db_dir())?;
    let limiter = RateLimiter::new(Arc::new(store) as Arc<dyn RecordStore>);

    let signer = Ed25519TxSigner::from_hex(&cfg.signer_key, &cfg.chain_id, &cfg.denom)?;
    tracing::info!(funding_account = %signer.funding_account(), "signer ready");
    let client = RestLedgerClient::new(&cfg.rest_url, signer, cfg.ledger_timeout())?;
    let sequencer = Sequencer::connect(client, cfg.retry_policy()).await?;
    let (handle, worker) = faucet_sequencer::spawn(sequencer);

    let coordinator = Arc::new(GrantCoordinator::new(limiter, handle, cfg.drip.clone())?);
    let router = http::router(coordinator, &cfg.allowed_origins)?;

    let addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        chain_id = %cfg.chain_id,
        version = faucet_types::constants::VERSION,
        "drip faucet listening"
    );

    http::serve(listener, router, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl-c handler failed");
        }
        tracing::info!("shutdown requested");
    })
    .await?;

    // Router is gone, so the last handle is dropped and the queue drains.
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "sequencer worker ended abnormally");
    }
    Ok(())
}
