//! HTTP endpoints of the daemon.
//!
//! - `GET /` - handshake
//! - `POST /request` - run an execution; always answers 200
//! - `POST /variables` - set a session variable

use super::{Daemon, ExecuteResponse, HandshakeResponse, SetVariableRequest};
use crate::executor::ExecutionContext;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use tokio::net::TcpListener;

/// Builds the daemon's router.
pub fn router(daemon: Daemon) -> Router {
    Router::new()
        .route("/", get(handshake_handler))
        .route("/request", post(execute_handler))
        .route("/variables", post(set_variable_handler))
        .with_state(daemon)
}

/// Serves the daemon on a bound listener until `shutdown` completes.
pub async fn serve(
    listener: TcpListener,
    daemon: Daemon,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        log::info!("Daemon listening on http://{}/", address);
    }
    axum::serve(listener, router(daemon))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handshake_handler(State(daemon): State<Daemon>) -> Json<HandshakeResponse> {
    Json(daemon.handshake())
}

// The body is decoded by hand so that malformed input still gets a
// structured reply.
async fn execute_handler(State(daemon): State<Daemon>, body: Bytes) -> Json<ExecuteResponse> {
    let context: ExecutionContext = match serde_json::from_slice(&body) {
        Ok(context) => context,
        Err(e) => {
            log::warn!("Rejected undecodable execution request: {}", e);
            return Json(ExecuteResponse::rejected(
                "ConfigurationError",
                format!("invalid execution request: {}", e),
            ));
        }
    };
    Json(daemon.execute_request(context).await)
}

async fn set_variable_handler(
    State(daemon): State<Daemon>,
    Json(request): Json<SetVariableRequest>,
) -> StatusCode {
    daemon.set_variable(&request);
    StatusCode::OK
}
