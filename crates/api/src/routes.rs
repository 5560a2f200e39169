use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use feed_pipeline::{FeedPipeline, FeedPreview};
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec};
use scoring::{explain_post, lint_rules, Post, ScoreBreakdown, ScoredPost};
use serde_json::json;
use tracing::instrument;

use crate::dto::{ClearResponse, ExplainRequest, FeedRequest, LintRequest, LintResponse, PreviewRequest};
use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: FeedPipeline,
    pub metrics_path: &'static str,
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    let metrics_path: &'static str = state.metrics_path;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/feed/scored", post(scored_feed))
        .route("/feed/filtered", post(filtered_feed))
        .route("/feed/preview", post(preview))
        .route("/feed/explain", post(explain))
        .route("/feed/cache/clear", post(clear_cache))
        .route("/rules/lint", post(lint))
        .route(metrics_path, get(metrics))
        .with_state(state)
}

static FEED_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "api_feed_requests_total",
        "Feed endpoint requests by route",
        &["route"]
    )
    .expect("feed requests counter")
});

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[instrument(skip_all, fields(posts = request.posts.len(), rules = request.rules.len()))]
async fn scored_feed(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<FeedRequest>,
) -> ApiResult<Json<Vec<ScoredPost>>> {
    FEED_REQUESTS.with_label_values(&["scored"]).inc();
    let scored = state
        .pipeline
        .scored_feed(request.posts.into(), request.rules.into())
        .await?;
    Ok(Json(scored.as_ref().clone()))
}

#[instrument(skip_all, fields(posts = request.posts.len(), rules = request.rules.len()))]
async fn filtered_feed(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<FeedRequest>,
) -> ApiResult<Json<Vec<Post>>> {
    FEED_REQUESTS.with_label_values(&["filtered"]).inc();
    let visible = state
        .pipeline
        .filtered_feed(request.posts.into(), request.rules.into())
        .await?;
    Ok(Json(visible.as_ref().clone()))
}

#[instrument(skip_all, fields(rules = request.rules.len()))]
async fn preview(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Json<FeedPreview>> {
    FEED_REQUESTS.with_label_values(&["preview"]).inc();
    let rules = request.rules.into();
    let preview = match request.sample {
        Some(sample) if sample.is_empty() => {
            return Err(ApiError::bad_request("sample must contain at least one post"));
        }
        Some(sample) => state.pipeline.preview_with(sample.into(), rules).await?,
        None => state.pipeline.preview(rules).await?,
    };
    Ok(Json(preview.as_ref().clone()))
}

#[instrument(skip_all, fields(post = %request.post.id, rules = request.rules.len()))]
async fn explain(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ExplainRequest>,
) -> ApiResult<Json<ScoreBreakdown>> {
    FEED_REQUESTS.with_label_values(&["explain"]).inc();
    let ctx = state.pipeline.eval_context();
    Ok(Json(explain_post(&request.post, &request.rules, &ctx)))
}

#[instrument(skip_all, fields(rules = request.rules.len()))]
async fn lint(Json(request): Json<LintRequest>) -> Json<LintResponse> {
    FEED_REQUESTS.with_label_values(&["lint"]).inc();
    Json(lint_rules(&request.rules).into())
}

#[instrument(skip(state))]
async fn clear_cache(State(state): State<Arc<ApiState>>) -> Json<ClearResponse> {
    let cleared = state.pipeline.clear().await;
    tracing::info!(cleared, "projection caches cleared");
    Json(ClearResponse { cleared })
}

#[instrument]
async fn metrics() -> ApiResult<impl IntoResponse> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let content_type = encoder.format_type().to_string();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok((
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, content_type)],
        buffer,
    ))
}
