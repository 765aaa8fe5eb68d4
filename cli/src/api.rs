//! Admin HTTP surface.
//!
//! Every `/sync/*` and `/stats/*` route only schedules work: it validates the
//! path parameter, starts a background task and answers immediately. Progress
//! and failures are reported through the logs.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use meshindex_collector::{Collector, CollectorMetrics, Phase, Resync};
use serde::Serialize;
use serde_json::json;
use tracing::info;

/// Shared state for all admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub resync: Resync,
    pub collector: Arc<Collector>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub phase: Phase,
    pub node_url: String,
    pub metrics: CollectorMetrics,
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/sync/layer/:layer", get(sync_layer))
        .route("/sync/epoch/:epoch", get(sync_epoch))
        .route("/sync/from/:timestamp", get(sync_from))
        .route("/stats/epoch/:epoch", get(epoch_stats))
        .with_state(state)
}

fn bad_request(param: &str, raw: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("invalid {param}: {raw:?}") })),
    )
        .into_response()
}

fn accepted(operation: &str, target: serde_json::Value) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "accepted": true, "operation": operation, "target": target })),
    )
        .into_response()
}

async fn status(State(state): State<AdminState>) -> Json<StatusResponse> {
    let phase = *state.collector.phase().borrow();
    Json(StatusResponse {
        phase,
        node_url: state.collector.config().node_url.clone(),
        metrics: state.collector.metrics(),
    })
}

async fn sync_layer(State(state): State<AdminState>, Path(raw): Path<String>) -> Response {
    let Ok(layer) = raw.parse::<u32>() else {
        return bad_request("layer", &raw);
    };
    info!(layer, "admin: sync layer requested");
    drop(state.resync.sync_layer(layer));
    accepted("sync_layer", json!(layer))
}

async fn sync_epoch(State(state): State<AdminState>, Path(raw): Path<String>) -> Response {
    let Ok(epoch) = raw.parse::<u32>() else {
        return bad_request("epoch", &raw);
    };
    info!(epoch, "admin: sync epoch requested");
    drop(state.resync.sync_epoch(epoch));
    accepted("sync_epoch", json!(epoch))
}

async fn sync_from(State(state): State<AdminState>, Path(raw): Path<String>) -> Response {
    let ts = match raw.parse::<i64>() {
        Ok(ts) if ts >= 0 => ts,
        _ => return bad_request("timestamp", &raw),
    };
    info!(ts, "admin: sync from timestamp requested");
    drop(state.resync.sync_from_time(ts));
    accepted("sync_from_time", json!(ts))
}

async fn epoch_stats(State(state): State<AdminState>, Path(raw): Path<String>) -> Response {
    let Ok(epoch) = raw.parse::<u32>() else {
        return bad_request("epoch", &raw);
    };
    info!(epoch, "admin: epoch stats recalculation requested");
    drop(state.resync.recalculate_epoch_stats(epoch));
    accepted("recalculate_epoch_stats", json!(epoch))
}
