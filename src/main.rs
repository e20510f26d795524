//! Connection-info server.
//!
//! Serves `GET /whoami`, answering each caller with the addresses and TLS
//! session of its own connection as seen by the server.
//!
//! ```text
//!     Client ──TCP──▶ listener ──(TLS?)──▶ ConnInfo captured
//!                                              │
//!                                              ▼
//!                                   bind into request Context
//!                                              │
//!                                              ▼
//!                                   handler reads ConnInfo ──▶ JSON
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use conninfo::config::{load_config, validation::validate_config, ConfigError, ServerConfig};
use conninfo::lifecycle::{signals, Shutdown};
use conninfo::observability::logging;
use conninfo::{Error, HttpServer};

#[derive(Parser)]
#[command(name = "conninfo-server")]
#[command(about = "HTTP server reporting each caller's connection info", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init(&config.observability)?;

    tracing::info!("conninfo-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
