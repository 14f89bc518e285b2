use anyhow::{Context, Result};
use callscribe::{
    create_router, AppState, Config, FsStore, IngestService, QueryService, StoreAllocator,
    TranscriptStore,
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "callscribe", about = "Transcript ingestion and query service")]
struct Args {
    /// Config file (without extension)
    #[arg(long, default_value = "config/callscribe")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);
    info!("Transcript store at {}", cfg.store.path);

    let store: Arc<dyn TranscriptStore> = Arc::new(FsStore::open(&cfg.store.path)?);
    let allocator = Arc::new(StoreAllocator::new(Arc::clone(&store)));
    let state = AppState::new(
        IngestService::new(Arc::clone(&store), allocator),
        QueryService::new(Arc::clone(&store)),
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
