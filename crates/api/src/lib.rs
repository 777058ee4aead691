mod config;
mod error;
mod rate_limit;
mod upload;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pagesplit_core::{pages_per_split_from, plan_split, sanitize_upload_name, SplitPlan};
use pagesplit_document::{partition, write_bundle, PdfDocument, ScratchDir};
use pagesplit_observability::{AppMetrics, MetricsSnapshot};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use crate::config::ApiConfig;
pub use crate::error::ApiError;
pub use crate::rate_limit::IpRateLimiter;
use crate::upload::{read_split_upload, SplitUpload};

const SCRATCH_PREFIX: &str = "pagesplit-";

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<ApiConfig>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: IpRateLimiter,
}

impl ApiState {
    pub fn new(config: ApiConfig) -> Self {
        let limiter = IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max);
        Self {
            config: Arc::new(config),
            metrics: AppMetrics::shared(),
            limiter,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    service: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    max_upload_bytes: usize,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateSplitResponse {
    is_valid: bool,
    message: String,
    needs_confirmation: bool,
    total_pages: u32,
}

impl From<SplitPlan> for ValidateSplitResponse {
    fn from(plan: SplitPlan) -> Self {
        Self {
            is_valid: plan.is_valid,
            message: plan.message,
            needs_confirmation: plan.needs_confirmation,
            total_pages: plan.total_pages,
        }
    }
}

struct SplitArchive {
    file_name: String,
    bytes: Vec<u8>,
    plan: SplitPlan,
}

pub fn build_app(config: ApiConfig) -> Router {
    build_router(ApiState::new(config))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/validate-split", post(validate_split))
        .route("/api/split-pdf", post(split_pdf))
        .layer(build_cors_layer(&state.config.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(StatusResponse {
            status: "ok",
            service: "pagesplit",
        }),
    )
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        max_upload_bytes: state.config.max_upload_bytes,
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn validate_split(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<Json<ValidateSplitResponse>, ApiError> {
    let started = Instant::now();
    state.metrics.inc_request();
    state.metrics.inc_validation();

    let result = run_validation(&state, multipart).await.map(Json);
    track(&state, started, result)
}

async fn split_pdf(State(state): State<ApiState>, multipart: Multipart) -> Response {
    let started = Instant::now();
    state.metrics.inc_request();

    match track(&state, started, run_split(&state, multipart).await) {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

async fn run_validation(
    state: &ApiState,
    multipart: Multipart,
) -> Result<ValidateSplitResponse, ApiError> {
    let upload = read_split_upload(multipart, state.config.max_upload_bytes).await?;
    let pages_per_split = pages_per_split_from(upload.pages_per_split)?;

    let document = parse_document(upload.bytes).await?;
    let plan = plan_split(document.page_count(), pages_per_split);

    info!(
        total_pages = plan.total_pages,
        pages_per_split = plan.pages_per_split,
        is_valid = plan.is_valid,
        needs_confirmation = plan.needs_confirmation,
        "split validated"
    );
    Ok(ValidateSplitResponse::from(plan))
}

async fn run_split(state: &ApiState, multipart: Multipart) -> Result<Response, ApiError> {
    let upload = read_split_upload(multipart, state.config.max_upload_bytes).await?;
    let archive = tokio::task::spawn_blocking(move || build_archive(upload))
        .await
        .context("split task failed")??;

    state.metrics.record_split(archive.plan.total_pages);
    info!(
        archive = %archive.file_name,
        parts = archive.plan.chunk_count,
        total_pages = archive.plan.total_pages,
        bytes = archive.bytes.len(),
        "split archive built"
    );

    let disposition = format!("attachment; filename=\"{}\"", archive.file_name);
    let disposition =
        HeaderValue::from_str(&disposition).context("invalid content-disposition header")?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    )
        .into_response())
}

async fn parse_document(bytes: Bytes) -> Result<PdfDocument, ApiError> {
    let document = tokio::task::spawn_blocking(move || PdfDocument::parse(&bytes))
        .await
        .context("document parsing task failed")??;
    Ok(document)
}

/// Runs on a blocking thread: parse, plan, partition and zip. The scratch
/// directory lives exactly as long as this call.
fn build_archive(upload: SplitUpload) -> Result<SplitArchive, ApiError> {
    let pages_per_split = pages_per_split_from(upload.pages_per_split)?;
    let base_name = sanitize_upload_name(upload.file_name.as_deref());

    let document = PdfDocument::parse(&upload.bytes)?;
    drop(upload);

    let plan = plan_split(document.page_count(), pages_per_split).into_result()?;
    let bundle = partition(&document, &plan, &base_name)?;
    drop(document);

    let scratch = ScratchDir::create(SCRATCH_PREFIX).context("failed to create scratch directory")?;
    let file_name = bundle.archive_name();
    let archive_path = scratch.join(&file_name);

    let file = File::create(&archive_path)
        .with_context(|| format!("failed to create {}", archive_path.display()))?;
    let mut writer = write_bundle(&bundle, BufWriter::new(file))?;
    writer.flush().context("failed to flush archive")?;
    drop(writer);
    drop(bundle);

    let bytes = std::fs::read(&archive_path)
        .with_context(|| format!("failed to read {}", archive_path.display()))?;
    scratch.release();

    Ok(SplitArchive {
        file_name,
        bytes,
        plan,
    })
}

fn track<T>(state: &ApiState, started: Instant, result: Result<T, ApiError>) -> Result<T, ApiError> {
    state.metrics.observe_latency(started.elapsed());
    if let Err(error) = &result {
        if error.is_client_error() {
            state.metrics.inc_rejected();
        } else {
            state.metrics.inc_failure();
        }
    }
    result
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true)
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || !request.uri().path().starts_with("/api/") {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if let Err(retry_after) = state.limiter.check(&ip) {
        state.metrics.inc_rejected();
        return ApiError::RateLimited { retry_after }.into_response();
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'; base-uri 'none'"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesplit_document::fixtures::sample_pdf;

    fn upload(name: &str, pages: u32, per: i64) -> SplitUpload {
        SplitUpload {
            file_name: Some(name.to_string()),
            bytes: Bytes::from(sample_pdf(pages)),
            pages_per_split: per,
        }
    }

    #[test]
    fn archive_is_named_after_sanitized_upload() {
        let archive = build_archive(upload("Board Minutes (Q3).pdf", 5, 2))
            .unwrap_or_else(|error| panic!("archive should build: {error}"));
        assert_eq!(archive.file_name, "Board_Minutes_Q3_split.zip");
        assert_eq!(archive.plan.chunk_count, 3);
        assert!(archive.bytes.starts_with(b"PK"));
    }

    #[test]
    fn infeasible_plan_is_rejected_before_partitioning() {
        let error = match build_archive(upload("short.pdf", 2, 5)) {
            Ok(_) => panic!("plan should be infeasible"),
            Err(error) => error,
        };
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error.to_string(),
            "PDF has 2 pages but requested 5 pages per split"
        );
    }

    #[test]
    fn zero_pages_per_split_is_rejected() {
        let error = match build_archive(upload("doc.pdf", 4, 0)) {
            Ok(_) => panic!("zero chunk size must fail"),
            Err(error) => error,
        };
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }
}
