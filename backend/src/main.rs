use std::{net::SocketAddr, sync::Arc};

use backend::{
    create_router,
    providers::http::{HttpMapsProvider, ProviderConfig},
    AppState, DiscoverySettings, Providers,
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url =
        std::env::var("MAPS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let api_key = std::env::var("MAPS_API_KEY").expect("MAPS_API_KEY must be set");

    let provider = Arc::new(HttpMapsProvider::new(ProviderConfig { base_url, api_key }));
    let providers = Providers {
        routing: provider.clone(),
        geocoding: provider.clone(),
        places: provider.clone(),
        distance: provider,
    };

    let state = AppState::new(providers, DiscoverySettings::default());
    let app = create_router(state).layer(CorsLayer::permissive());

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .expect("valid socket address");
    tracing::info!("starting backend on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}
