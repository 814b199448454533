use std::net::SocketAddr;

use backend::{AppState, config::AppConfig, create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::default();
    if let Ok(url) = std::env::var("GEOCODER_URL") {
        config.geocoder.base_url = url;
    }
    if let Ok(url) = std::env::var("ROUTING_URL") {
        config.routing.base_url = url;
    }
    if let Ok(url) = std::env::var("PORTRAIT_URL") {
        config.nearby.portrait_base_url = url;
    }
    tracing::info!(
        "using geocoder {} and routing service {}",
        config.geocoder.base_url,
        config.routing.base_url
    );

    let state = AppState::from_config(&config).expect("build http clients");
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .expect("valid socket address");
    tracing::info!("starting backend on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}
