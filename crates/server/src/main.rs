//! Process entry point (SPEC_FULL.md §4.11, §4.13): load configuration,
//! connect and migrate the store, then serve the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use imagedesc_core::config::Config;
use imagedesc_core::db::Store;
use imagedesc_core::Core;
use imagedesc_server::routes;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration, refusing to start");
            std::process::exit(1);
        }
    };
    info!(config = ?config, "configuration loaded");

    let store = match Store::connect(&config.database_url).await {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "failed to connect to the database");
            std::process::exit(1);
        }
    };
    if let Err(err) = store.migrate().await {
        error!(error = %err, "schema migration failed");
        std::process::exit(1);
    }

    let bind_addr = config.bind_addr.clone();
    let request_timeout = config.request_timeout;
    let max_body_bytes = config.max_body_bytes;

    let core = Arc::new(Core::new(store, config));
    let app = routes::build_router(core).layer(RequestBodyLimitLayer::new(max_body_bytes)).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async { StatusCode::REQUEST_TIMEOUT }))
            .layer(TimeoutLayer::new(request_timeout)),
    );

    let addr: SocketAddr = bind_addr.parse().expect("BIND_ADDR must be a valid socket address");
    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind listener");
    info!(%addr, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("server error");
}

fn init_tracing() {
    let json_format = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,imagedesc_core=debug,imagedesc_server=debug"));

    if json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).compact().init();
    }
}

