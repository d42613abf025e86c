use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vigor_llm::ClientFactory;
use vigor_stream::ChatSourceAdapter;

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

    tracing::info!(
        provider = ?config.provider.kind,
        model = %config.llm.model,
        "Starting vigor"
    );

    let client = ClientFactory::create_chat_client(config.provider_config())?;
    let source = Arc::new(ChatSourceAdapter::new(client));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    repl::run(&config, source, stdin, tokio::io::stdout()).await
}

/// Logs go to stderr so they never interleave with the streamed reply
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

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
