use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::ServerConfig;

/// Full application: `/api` routes plus request tracing, timeout and CORS
pub fn app(state: AppState, server: &ServerConfig) -> Result<Router> {
    Ok(Router::new()
        .nest("/api", api::router(state))
        // nested "/" only answers "/api"
        .route("/api/", get(api::root))
        .layer(TraceLayer::new_for_http())
        .layer(timeout(server))
        .layer(cors(server)?))
}

/// Handlers that overrun the request budget answer 504
fn timeout(server: &ServerConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(
        StatusCode::GATEWAY_TIMEOUT,
        Duration::from_secs(server.request_timeout_seconds.into()),
    )
}

fn cors(server: &ServerConfig) -> Result<CorsLayer> {
    let origins = server.cors_origins();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid CORS origin '{origin}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

pub async fn run(state: AppState) -> Result<()> {
    let server = state.config.server.clone();
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", server.host, server.port))?;
    let app = app(state, &server)?;

    match (&server.tls_cert_path, &server.tls_key_path) {
        (Some(cert), Some(key)) => serve_tls(app, addr, cert, key).await,
        _ => serve_plain(app, addr).await,
    }
}

async fn serve_plain(app: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Web server running at http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")
}

#[cfg(feature = "tls")]
async fn serve_tls(app: Router, addr: SocketAddr, cert: &str, key: &str) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let tls = RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| format!("Failed to load TLS certificate {cert} and key {key}"))?;

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    info!("Web server running at https://{addr}");
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("Web server failed")
}

#[cfg(not(feature = "tls"))]
async fn serve_tls(app: Router, addr: SocketAddr, _cert: &str, _key: &str) -> Result<()> {
    tracing::warn!("Built without the tls feature; ignoring TLS settings");
    serve_plain(app, addr).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutting down");
}
