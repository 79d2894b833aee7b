use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use virturatech_backend::{api_router, config::ServerConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,virturatech_backend=debug"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;

    let _guard = sentry::init((
        server_config.sentry_dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let state = Arc::new(AppState::from_env());

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(AllowOrigin::exact(
            HeaderValue::from_str(&server_config.frontend_url)
                .context("FRONTEND_URL is not a valid header value")?,
        ))
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    let mut app = api_router(state);
    // Serve the exported site for everything that is not an API route
    if let Some(dir) = &server_config.static_dir {
        tracing::info!("Serving static site from {}", dir.display());
        let not_found = dir.join("404.html");
        app = app.fallback_service(ServeDir::new(dir).not_found_service(ServeFile::new(not_found)));
    }

    let app = app
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    tracing::info!("Starting server on port {}", server_config.port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", server_config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", server_config.port))?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
