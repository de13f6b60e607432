use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dose_runner::logging::init_logging;
use dose_runner::score_server::{router, SCORES_PATH};
use dose_runner::score_store::ScoreStore;
use tokio::sync::Mutex;

/// Serves the high-score table over HTTP.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "SCORES_DB_PATH", default_value = ".data/scores.json")]
    data: PathBuf,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let store = ScoreStore::new(cli.data.clone());
    tracing::info!(path = %cli.data.display(), entries = store.len(), "score store loaded");
    let app = router(Arc::new(Mutex::new(store)));

    let bind_addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, path = SCORES_PATH, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
