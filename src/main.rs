//! REST API server for the DSA notes agent.

use dsa_notes_agent::{api, config::Config, logging};

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env(DEFAULT_PORT) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("INFO");
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    logging::init_logging(&config.log_level);

    tracing::info!(
        "Starting DSA Agent API v{} on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.host,
        config.port
    );
    api::serve(config).await
}
