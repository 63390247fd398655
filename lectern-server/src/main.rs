// Lectern - documents and text read aloud over HTTP

use anyhow::Context;
use clap::Parser;
use lectern_server::{create_router, ApiState, ConversionOrchestrator, DocumentStore, LecternConfig};
use lectern_spk::{SlotStore, SpeechSynthesizer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lectern-server")]
#[command(about = "Convert documents and text to speech over HTTP", version)]
struct Args {
    /// Configuration file (TOML or YAML)
    #[arg(short, long, env = "LECTERN_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for uploads and generated audio
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<LecternConfig> {
    let mut config = match &args.config {
        Some(path) => LecternConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => LecternConfig::default(),
    };

    config.apply_env()?;

    if let Some(host) = &args.host {
        config.network.bind_address = host.clone();
    }
    if let Some(port) = args.port {
        config.network.bind_port = port;
    }
    if let Some(root) = &args.storage_root {
        config.storage.root = root.clone();
    }
    if let Some(level) = &args.log_level {
        config.instance.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &LecternConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.instance.log_level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let result = if config.instance.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config)?;

    info!("Starting lectern-server {}", env!("CARGO_PKG_VERSION"));

    // Created here if absent; holds both uploads and audio slots
    let slots = SlotStore::new(&config.storage.root)
        .with_context(|| format!("Failed to prepare storage root {}", config.storage.root.display()))?;
    info!("Storage root: {}", slots.root().display());

    let synthesizer = SpeechSynthesizer::new(&config.speech, slots).context("Failed to initialize speech synthesis")?;
    let documents = DocumentStore::new(&config.storage.root, config.storage.keep_uploads);

    let state = ApiState {
        orchestrator: Arc::new(ConversionOrchestrator::new(synthesizer, documents)),
        max_upload_bytes: config.storage.max_upload_bytes(),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.network.bind_address, config.network.bind_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or, on Unix, SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
