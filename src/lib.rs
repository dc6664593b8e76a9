pub mod config;
pub mod encode;
pub mod export;
pub mod track;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use config::ServiceConfig;
use export::{DocumentFormat, ExportError, FileSink, convert_activity, export_batch};
use track::Activity;

#[derive(Clone)]
struct AppState {
    config: Arc<ServiceConfig>,
}

pub fn build_app(config: ServiceConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(landing_page))
        .route("/convert", post(handle_convert))
        .route("/export", post(handle_export))
        .with_state(state)
}

async fn landing_page() -> &'static str {
    "runsync: POST an activity to /convert, or a list of activities to /export\n"
}

#[derive(Debug, Default, Deserialize)]
struct ConvertQuery {
    format: Option<DocumentFormat>,
}

async fn handle_convert(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
    Json(activity): Json<Activity>,
) -> Response {
    match convert_activity(&activity, query.format, &state.config) {
        Ok(document) => {
            tracing::debug!(
                activity_id = %document.activity_id,
                format = %document.format,
                point_count = document.point_count,
                "Activity converted"
            );
            let headers = [
                (
                    header::CONTENT_TYPE,
                    document.format.content_type().to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", document.file_name()),
                ),
            ];
            (StatusCode::OK, headers, document.bytes).into_response()
        }
        Err(err) => render_export_error(err),
    }
}

async fn handle_export(
    State(state): State<AppState>,
    Json(activities): Json<Vec<Activity>>,
) -> Response {
    let config = Arc::clone(&state.config);
    let outcome = tokio::task::spawn_blocking(move || {
        let sink = FileSink::new(config.output_dir.clone());
        export_batch(&activities, &config, &sink)
    })
    .await;

    match outcome {
        Ok(report) => Json(report).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Export task did not complete");
            (StatusCode::INTERNAL_SERVER_ERROR, "Export task failed").into_response()
        }
    }
}

fn render_export_error(error: ExportError) -> Response {
    tracing::warn!(error = %error, "Activity conversion failed");
    let status = match error {
        ExportError::Track(_) | ExportError::Encode(_) => StatusCode::BAD_REQUEST,
        ExportError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string()).into_response()
}
