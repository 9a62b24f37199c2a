use agentdeck_client::HttpClient;
use agentdeck_session::ChatSession;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod repl;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!(base_url = %config.api.base_url, "Starting agentdeck playground");

    let client = Arc::new(HttpClient::new(&config.client_config())?);

    let mut builder = ChatSession::builder().client(client);
    if let Some(agent) = &config.playground.default_agent {
        builder = builder.agent(agent.clone());
    }
    let session = builder.build()?;

    repl::run(session, &config.playground).await
}

// Logs go to stderr; stdout carries the conversation
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
