use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_cell::PortalContext;
use clinic_portal::router::create_router;
use shared_config::PortalConfig;
use shared_utils::storage::FileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic portal");

    let config = PortalConfig::from_env();
    let addr = config
        .socket_addr()
        .with_context(|| format!("invalid PORTAL_BIND_ADDR '{}'", config.bind_addr))?;

    let store = FileStore::open(&config.state_path)?;
    info!("Client state kept in {}", store.path().display());

    let ctx = Arc::new(PortalContext::new(config, Arc::new(store)));
    match ctx.session.hydrate() {
        Some(user) => info!("Resuming session of {}", user.email),
        None => warn!("No saved session, visitors start at the login screen"),
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(ctx)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
