use chat_core::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(true)
                .with_file(false),
        )
        .init();

    tracing::info!("Starting standalone chat relay...");

    let config = Config::new();
    if config.session_secret.is_empty() {
        tracing::warn!("SESSION_SECRET is empty; all session cookies will be rejected");
    }

    if let Err(e) = web_service::run(config).await {
        tracing::error!("Failed to run web service: {}", e);
        std::process::exit(1);
    }
}
