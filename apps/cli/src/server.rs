//! HTTP surface: `GET /api/jobs` runs the pipeline and returns the posting list.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use jobwatch_core::{Pipeline, SilentProgress};
use jobwatch_crawler::HttpFetcher;
use jobwatch_shared::{ErrorKind, JobPosting, JobwatchError};
use jobwatch_storage::Storage;

pub(crate) type JobPipeline = Pipeline<HttpFetcher, Storage>;

#[derive(Clone)]
pub(crate) struct AppState {
    pipeline: Arc<JobPipeline>,
}

pub(crate) fn router(pipeline: Arc<JobPipeline>) -> Router {
    Router::new()
        .route("/api/jobs", get(list_jobs))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

/// Bind `addr` and serve until ctrl-c.
///
/// With a non-zero `refresh_every`, a background task also runs the pipeline
/// on that interval.
pub(crate) async fn serve(
    pipeline: Arc<JobPipeline>,
    addr: &str,
    refresh_every: Option<Duration>,
) -> color_eyre::Result<()> {
    if let Some(period) = refresh_every {
        tokio::spawn(refresh_loop(pipeline.clone(), period));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("server stopped");
    Ok(())
}

async fn refresh_loop(pipeline: Arc<JobPipeline>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match pipeline.run(&SilentProgress).await {
            Ok(report) => info!(
                total = report.postings.len(),
                inserted = report.inserted,
                deleted = report.deleted,
                "scheduled refresh complete"
            ),
            Err(e) => warn!(error = %e, kind = %e.kind(), "scheduled refresh failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobPosting>>, ApiError> {
    let report = state.pipeline.run(&SilentProgress).await?;
    Ok(Json(report.postings))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.pipeline.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "error",
                error: Some(e.to_string()),
            }),
        ),
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// A pipeline failure rendered as `{"error": {"kind", "message"}}`.
pub(crate) struct ApiError(JobwatchError);

impl From<JobwatchError> for ApiError {
    fn from(err: JobwatchError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    kind: ErrorKind,
    message: String,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Transport => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        warn!(error = %self.0, %kind, "request failed");

        let body = ErrorBody {
            error: ErrorDetail {
                kind,
                message: self.0.to_string(),
            },
        };
        (status_for(kind), Json(body)).into_response()
    }
}
