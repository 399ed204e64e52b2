use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::cli::ServeArgs;
use crate::lookup::{LookupError, LookupService};

#[derive(Clone)]
pub struct AppState {
    lookup: Arc<LookupService>,
}

impl AppState {
    pub fn new(lookup: LookupService) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let lookup = LookupService::from_args(&opts.client).context("configure lookup clients")?;
    tracing::info!(
        registry = %opts.client.registry_url,
        enrichment = lookup.enrichment_enabled(),
        "lookup service ready"
    );

    let app = router(AppState::new(lookup));

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/lookup", post(api_lookup))
        .route("/api/lookup/:npi", get(api_lookup_path))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_lookup(State(st): State<AppState>, body: Bytes) -> Response {
    let npi = match npi_from_body(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "unreadable lookup request body");
            return LookupError::Internal(e).into_response();
        }
    };
    respond(st.lookup.handle(npi.as_deref()).await)
}

async fn api_lookup_path(State(st): State<AppState>, Path(npi): Path<String>) -> Response {
    respond(st.lookup.handle(Some(&npi)).await)
}

fn respond(res: Result<crate::lookup::LookupResult, LookupError>) -> Response {
    match res {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Pulls `npi` out of a JSON request body. A body that is not JSON is an
/// error; a missing or non-scalar `npi` yields `None`.
fn npi_from_body(body: &[u8]) -> anyhow::Result<Option<String>> {
    let v: Value = serde_json::from_slice(body).context("parse lookup request JSON")?;
    if v.is_null() {
        return Err(anyhow!("lookup request body is null"));
    }
    Ok(match v.get("npi") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
