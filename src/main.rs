use std::sync::Arc;

use anyhow::Result;
use rag_relay::llm::openai::OpenAi;
use rag_relay::{router, AppConfig, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rag_relay=debug")),
        )
        .with(fmt::layer().with_target(true))
        .init();

    let config = AppConfig::load();
    let provider = Arc::new(OpenAi::new(
        config.provider.base_url.clone(),
        config.provider.embedding_model.clone(),
    ));
    let addr = config.bind_addr();
    let state = AppState::new(provider, config);

    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
