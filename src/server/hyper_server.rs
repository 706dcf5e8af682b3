//! Hyper-based HTTP server
//!
//! Direct Hyper implementation, no router or middleware: the endpoint has
//! three routes and answers every one of them with the same CORS headers.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use tokio::net::TcpSocket;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::models::SharedModel;
use crate::protocol::http::{
    decode_request, read_body, ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN, CONTENT_TYPE_JSON,
    CONTENT_TYPE_TEXT, MODEL_PATH, SIMILARITY_PATH,
};
use crate::server::config::ServerConfig;
use crate::similarity::SimilarityOrchestrator;

/// Shared state for Hyper server
#[derive(Clone)]
pub struct ServerState {
    model: SharedModel,
    identity: Arc<str>,
    orchestrator: Arc<SimilarityOrchestrator>,
    max_body_bytes: usize,
}

impl ServerState {
    /// Capture the model identity once; it never changes afterwards
    pub async fn new(model: SharedModel, config: &ServerConfig) -> Self {
        let identity: Arc<str> = Arc::from(model.lock().await.identity());
        Self {
            model,
            identity,
            orchestrator: Arc::new(SimilarityOrchestrator::new(config.truncation)),
            max_body_bytes: config.network.max_body_bytes,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Routes the endpoint knows about; everything else is a 404
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ModelIdentity,
    Similarity,
    Preflight,
}

impl Route {
    pub fn resolve(method: &Method, path: &str) -> Option<Self> {
        match (method, path) {
            (&Method::GET, MODEL_PATH) => Some(Route::ModelIdentity),
            (&Method::POST, SIMILARITY_PATH) => Some(Route::Similarity),
            (&Method::OPTIONS, _) => Some(Route::Preflight),
            _ => None,
        }
    }
}

/// Create the listening socket. Binding failures surface before any model
/// call can be accepted.
pub fn bind_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    // Faster restart after a crash
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1024)?.into_std()
}

/// Serve connections from `listener` until `shutdown` resolves.
///
/// Each connection runs on its own task; only the similarity route touches
/// the model, and it does so under the model mutex.
pub async fn serve<F>(
    listener: std::net::TcpListener,
    state: ServerState,
    shutdown: F,
) -> Result<(), hyper::Error>
where
    F: Future<Output = ()>,
{
    let make_svc = make_service_fn(move |_| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let span = info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %req.method(),
                    path = %req.uri().path(),
                );
                handle_request(req, state.clone()).instrument(span)
            }))
        }
    });

    Server::from_tcp(listener)?
        .http1_keepalive(true)
        .tcp_nodelay(true)
        .tcp_sleep_on_accept_errors(true)
        .serve(make_svc)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Main request handler
pub async fn handle_request(
    req: Request<Body>,
    state: ServerState,
) -> Result<Response<Body>, Infallible> {
    let response = match Route::resolve(req.method(), req.uri().path()) {
        Some(Route::ModelIdentity) => handle_model_identity(&state),
        Some(Route::Preflight) => empty_response(StatusCode::OK),
        Some(Route::Similarity) => handle_similarity(req, &state).await,
        None => {
            debug!("No route");
            empty_response(StatusCode::NOT_FOUND)
        }
    };

    Ok(with_cors(response))
}

fn handle_model_identity(state: &ServerState) -> Response<Body> {
    let mut response = Response::new(Body::from(state.identity.to_string()));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_TEXT));
    response
}

/// The compute path: decode, score, serialize. Failures answer 400 with an
/// empty body and are only described in the log.
async fn handle_similarity(req: Request<Body>, state: &ServerState) -> Response<Body> {
    let start_time = Instant::now();

    let decoded = match read_body(req.into_body(), state.max_body_bytes).await {
        Ok(bytes) => decode_request(&bytes),
        Err(e) => Err(e),
    };
    let request = match decoded {
        Ok(request) => request,
        Err(e) => {
            error!("❌ Error trying to decode a request: {}", e);
            return empty_response(StatusCode::BAD_REQUEST);
        }
    };

    let (rows, cols) = (request.queries.len(), request.documents.len());
    let result = {
        let mut model = state.model.lock().await;
        state.orchestrator.compute_similarity(request, &mut **model).await
    };

    let matrix = match result {
        Ok(matrix) => matrix,
        Err(e) => {
            error!("❌ Error trying to compute response for a JSON-valid request: {}", e);
            return empty_response(StatusCode::BAD_REQUEST);
        }
    };

    match serde_json::to_vec(&matrix) {
        Ok(json_body) => {
            info!("✅ Scored {}x{} in {:?}", rows, cols, start_time.elapsed());
            let mut response = Response::new(Body::from(json_body));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
            response
        }
        Err(e) => {
            error!("❌ Failed to serialize similarity matrix: {}", e);
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn empty_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn with_cors(mut response: Response<Body>) -> Response<Body> {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    response
}
