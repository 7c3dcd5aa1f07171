//! HTTP server.
//!
//! A hyper http1 accept loop in front of the export coordinator. Each
//! connection runs in its own task holding an in-flight guard; shutdown
//! stops accepting, then drains live connections up to the configured
//! timeout.

use std::convert::Infallible;
use std::net::SocketAddr;

use http::{header, Request, Response, StatusCode};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::body::{full, ResponseBody};
use crate::export;
use crate::routes::{generate_param, Route};
use crate::shutdown::{InFlight, Shutdown};
use crate::state::AppState;

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("bind error: {0}")]
    Bind(String),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The Pandora HTTP server.
///
/// # Example
///
/// ```rust,ignore
/// use pandora_server::{AppState, Server};
///
/// let state = AppState::from_config(config).await;
/// Server::new(state).run().await?;
/// ```
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a server over prepared state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind the configured address without accepting yet.
    ///
    /// Splitting bind from serve lets callers (and tests) learn the local
    /// address when binding port 0.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let addr = self.state.config.server.http_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind {addr}: {e}")))?;
        Ok(BoundServer {
            listener,
            state: self.state,
        })
    }

    /// Bind and serve until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.bind().await?.serve(Shutdown::with_os_signals()).await
    }
}

/// A server bound to its socket, ready to accept.
pub struct BoundServer {
    listener: TcpListener,
    state: AppState,
}

impl BoundServer {
    /// The address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the latch triggers, then drain.
    pub async fn serve(self, shutdown: Shutdown) -> Result<(), ServerError> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "server listening");
        }

        let in_flight = InFlight::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let state = self.state.clone();
                            let guard = in_flight.track();
                            let conn_shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) =
                                    serve_connection(state, stream, conn_shutdown).await
                                {
                                    tracing::debug!(%remote_addr, error = %e, "connection error");
                                }
                                drop(guard);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                _ = shutdown.wait() => {
                    tracing::info!("shutdown requested, no longer accepting");
                    break;
                }
            }
        }

        let drain_timeout = self.state.config.server.shutdown_timeout();
        tracing::info!(
            active = in_flight.active(),
            ?drain_timeout,
            "draining connections"
        );
        tokio::select! {
            _ = in_flight.drained() => {
                tracing::info!("all connections closed");
            }
            _ = tokio::time::sleep(drain_timeout) => {
                tracing::warn!(active = in_flight.active(), "drain timeout reached");
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Serve one connection until it closes or shutdown triggers.
async fn serve_connection(
    state: AppState,
    stream: tokio::net::TcpStream,
    shutdown: Shutdown,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let state = state.clone();
        async move { handle_request(state, req).await }
    });

    let conn = http1::Builder::new().serve_connection(io, service);

    tokio::select! {
        result = conn => result,
        _ = shutdown.wait() => Ok(()),
    }
}

/// Dispatch one request through the route table.
async fn handle_request(
    state: AppState,
    req: Request<Incoming>,
) -> Result<Response<ResponseBody>, Infallible> {
    let request_id = uuid::Uuid::now_v7();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let span = tracing::info_span!("request", %request_id, %method, %path);
    let response = async {
        match Route::match_request(&method, &path) {
            Some(Route::Health) => handle_health(&state),
            Some(route) => match route.origin() {
                Some(origin) => {
                    export::handle_export(state, origin, generate_param(query.as_deref())).await
                }
                None => handle_not_found(&path),
            },
            None => handle_not_found(&path),
        }
    }
    .instrument(span)
    .await;

    Ok(response)
}

/// Liveness payload.
fn handle_health(state: &AppState) -> Response<ResponseBody> {
    let body = serde_json::json!({
        "status": "ok",
        "service": "pandora",
        "version": env!("CARGO_PKG_VERSION"),
        "max_entries": state.config.export.max_entries,
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(body.to_string()))
        .unwrap_or_else(|_| Response::new(full("")))
}

/// 404 payload.
fn handle_not_found(path: &str) -> Response<ResponseBody> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(body.to_string()))
        .unwrap_or_else(|_| Response::new(full("")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pandora_config::PandoraConfig;
    use pandora_storage::ObjectStore;

    fn test_state() -> AppState {
        let config = PandoraConfig {
            server: pandora_config::ServerSection {
                http_addr: "127.0.0.1:0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let s3 = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                "test", "test", None, None, "static",
            ))
            .endpoint_url("http://127.0.0.1:1")
            .force_path_style(true)
            .build();
        AppState::with_store(config, ObjectStore::from_client(aws_sdk_s3::Client::from_conf(s3)))
    }

    #[test]
    fn test_health_response() {
        let response = handle_health(&test_state());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_response() {
        let response = handle_not_found("/nonexistent");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bind_invalid_address() {
        let mut config = PandoraConfig::default();
        config.server.http_addr = "not-an-address".to_string();
        let state = AppState::with_store(
            config,
            test_state().store.clone(),
        );

        let result = Server::new(state).bind().await;
        assert!(matches!(result, Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let bound = Server::new(test_state()).bind().await.unwrap();
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            bound.serve(shutdown),
        )
        .await;

        assert!(result.is_ok());
        assert!(result.unwrap().is_ok());
    }
}
