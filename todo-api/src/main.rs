use todo_api::config::{Config, DEFAULT_LOG_LEVEL};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let log_filter = config.log_filter();
    let fell_back = log_filter.is_none();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL)))
        .init();
    if fell_back {
        tracing::warn!(
            log_level = %config.log_level,
            "unrecognized LOG_LEVEL, falling back to {}",
            DEFAULT_LOG_LEVEL
        );
    }
    todo_api::web::start_web_server(config).await
}
