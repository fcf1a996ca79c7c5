use std::sync::Arc;

use lab_assist::config::AppConfig;
use lab_assist::notify::Notifier;
use lab_assist::queue::MatchEngine;
use lab_assist::server::slack_routes;
use lab_assist::slack::SlackClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    let slack = Arc::new(SlackClient::new(config.bot_token.clone()));
    let bot_user = slack.auth_test().await?;

    let engine = Arc::new(MatchEngine::new());
    let notifier: Arc<dyn Notifier> = slack;
    let app = slack_routes(engine, notifier, config.verification_token.clone());

    eprintln!("🎓 Lab Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Bot user: {bot_user}");
    eprintln!("   Events:   http://0.0.0.0:{}/slack/events", config.port);
    eprintln!("   Interact: http://0.0.0.0:{}/slack/interact", config.port);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
