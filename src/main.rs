use std::path::PathBuf;

use clap::Parser;

use studio_cms::media::MediaStore;
use studio_cms::state::AppState;
use studio_cms::store::DocumentStore;
use studio_cms::{app, config, seed};

#[derive(Debug, Parser)]
#[command(name = "studio-cms", about = "Content API for a fitness studio marketing site")]
struct Args {
    /// Port to listen on (overrides PORT / config)
    #[arg(long)]
    port: Option<u16>,

    /// Persist content to a JSON snapshot file across restarts
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Insert starter content into empty section collections
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, PORT, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing_subscriber::fmt::init();
    tracing::info!("Starting Studio CMS in {:?} mode", config.environment);

    let store = match &args.snapshot {
        Some(path) => DocumentStore::open(path).await?,
        None => DocumentStore::new(),
    };
    if args.seed {
        seed::seed_if_empty(&store).await;
    }

    let state = AppState::new(store, MediaStore::from_config());
    let app = app(state);

    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("🚀 Studio CMS server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
