//! HTTP surface: `GET /pp`, `POST /pp` and `GET /health`.

use crate::beatmaps::{BeatmapLookup, BeatmapOrigin};
use crate::config::ServiceConfig;
use crate::difficulty::PerformanceCalculator;
use crate::service::{
    CacheOrchestrator, ErrorEnvelope, LookupQuery, PerformanceEnvelope, PerformanceRequest,
    ServiceError,
};
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub struct AppState<L, O, C> {
    pub orchestrator: CacheOrchestrator<L, O, C>,
    pub request_timeout: Duration,
}

const ROUTES: [(&str, &str); 3] = [("GET", "/pp"), ("POST", "/pp"), ("GET", "/health")];

pub fn router<L, O, C>(state: Arc<AppState<L, O, C>>) -> Router
where
    L: BeatmapLookup + 'static,
    O: BeatmapOrigin + 'static,
    C: PerformanceCalculator + 'static,
{
    Router::new()
        .route("/pp", get(get_pp::<L, O, C>).post(post_pp::<L, O, C>))
        .route("/health", get(health::<L, O, C>))
        .with_state(state)
}

/// Binds the listener and serves until Ctrl-C.
pub async fn serve<L, O, C>(
    config: &ServiceConfig,
    orchestrator: CacheOrchestrator<L, O, C>,
) -> Result<(), Box<dyn std::error::Error>>
where
    L: BeatmapLookup + 'static,
    O: BeatmapOrigin + 'static,
    C: PerformanceCalculator + 'static,
{
    let state = Arc::new(AppState {
        orchestrator,
        request_timeout: config.request_timeout(),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    let url = format!("http://{}", listener.local_addr()?);

    log::info!("HTTP: All routes:");
    for (method, path) in ROUTES {
        log::info!("HTTP: [{}] {}{}", method, url, path);
    }
    log::info!("HTTP: Serving on {}", url);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("HTTP: Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("HTTP: cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn envelope<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let mut resp = (status, Json(body)).into_response();
    resp.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    resp
}

fn error_response(err: &ServiceError) -> Response {
    let status = StatusCode::from_u16(err.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    envelope(status, &ErrorEnvelope::from(err))
}

async fn get_pp<L, O, C>(
    State(state): State<Arc<AppState<L, O, C>>>,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> Response
where
    L: BeatmapLookup + 'static,
    O: BeatmapOrigin + 'static,
    C: PerformanceCalculator + 'static,
{
    let result = async {
        let Query(query) =
            query.map_err(|e| ServiceError::MalformedRequest(e.body_text()))?;
        let identity = query.identity()?;
        state
            .orchestrator
            .lookup(&identity)
            .await?
            .ok_or_else(|| ServiceError::NotFound(identity.to_string()))
    };

    match tokio::time::timeout(state.request_timeout, result).await {
        Ok(Ok(record)) => envelope(StatusCode::OK, &PerformanceEnvelope::from(&record)),
        Ok(Err(err)) => error_response(&err),
        Err(_) => error_response(&ServiceError::Timeout),
    }
}

async fn post_pp<L, O, C>(State(state): State<Arc<AppState<L, O, C>>>, body: Bytes) -> Response
where
    L: BeatmapLookup + 'static,
    O: BeatmapOrigin + 'static,
    C: PerformanceCalculator + 'static,
{
    let result = async {
        let request = PerformanceRequest::from_json(&body)?;
        state.orchestrator.evaluate(&request).await
    };

    match tokio::time::timeout(state.request_timeout, result).await {
        Ok(Ok(evaluation)) => {
            log::debug!(
                "HTTP: POST /pp {} served as {:?}",
                evaluation.record.content_hash,
                evaluation.status
            );
            envelope(StatusCode::OK, &PerformanceEnvelope::from(&evaluation.record))
        }
        Ok(Err(err)) => {
            log::warn!("HTTP: POST /pp failed: {}", err);
            error_response(&err)
        }
        Err(_) => {
            log::warn!("HTTP: POST /pp timed out");
            error_response(&ServiceError::Timeout)
        }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    records: i64,
}

async fn health<L, O, C>(State(state): State<Arc<AppState<L, O, C>>>) -> Response
where
    L: BeatmapLookup + 'static,
    O: BeatmapOrigin + 'static,
    C: PerformanceCalculator + 'static,
{
    match state.orchestrator.record_count().await {
        Ok(records) => envelope(
            StatusCode::OK,
            &Health {
                status: "ok",
                records,
            },
        ),
        Err(err) => error_response(&err),
    }
}
