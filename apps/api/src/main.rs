use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::{
    InMemoryAppointmentStore, SharedAppointmentStore, SupabaseAppointmentStore,
};
use shared_config::{AppConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Car Service Center API server");

    let config = AppConfig::from_env();
    let store = build_store(&config);
    let app = router::create_router(store, &config);

    let addr = config.listen_addr();
    info!("Starting server on port {}", config.port);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Unable to listen on {}: {}", addr, e);
            return Err(e).with_context(|| format!("failed to bind {}", addr));
        }
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server terminated unexpectedly")?;

    Ok(())
}

fn build_store(config: &AppConfig) -> SharedAppointmentStore {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory appointment store");
            Arc::new(InMemoryAppointmentStore::new())
        }
        StoreBackend::Supabase => {
            info!("Using Supabase appointment store at {}", config.supabase_url);
            Arc::new(SupabaseAppointmentStore::new(config))
        }
    }
}
