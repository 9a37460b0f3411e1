//! Browser chat UI for the DSA notes agent.

use dsa_notes_agent::{config::Config, logging, ui};

const DEFAULT_PORT: u16 = 8501;

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

    tracing::info!("Starting DSA Notes Agent chat UI");
    ui::serve(config).await
}
