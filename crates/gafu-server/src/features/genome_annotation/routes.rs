use crate::api::auth::CallContext;
use crate::api::response::ApiResponse;
use crate::error::AppResult;
use crate::features::FeatureState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::{
    commands::{export, upload},
    queries::{download, status},
    ExportOutput, ExportParams, GenbankFile, GenbankToGenomeAnnotationParams,
    GenomeAnnotationDetails, GenomeAnnotationToGenbankParams, StatusReport,
};

pub fn genome_annotation_routes() -> Router<FeatureState> {
    Router::new()
        .route("/upload", post(upload_genbank))
        .route("/download", post(download_genbank))
        .route("/export", post(export_genbank))
}

pub fn status_route() -> Router<FeatureState> {
    Router::new().route("/status", get(get_status))
}

#[tracing::instrument(skip_all)]
async fn upload_genbank(
    State(state): State<FeatureState>,
    context: CallContext,
    Json(params): Json<GenbankToGenomeAnnotationParams>,
) -> AppResult<ApiResponse<GenomeAnnotationDetails>> {
    let details = upload::handle(&state, context.token(), params).await?;
    Ok(ApiResponse::success(details))
}

#[tracing::instrument(skip_all)]
async fn download_genbank(
    State(state): State<FeatureState>,
    context: CallContext,
    Json(params): Json<GenomeAnnotationToGenbankParams>,
) -> AppResult<ApiResponse<GenbankFile>> {
    let file = download::handle(&state, context.token(), params).await?;
    Ok(ApiResponse::success(file))
}

#[tracing::instrument(skip_all)]
async fn export_genbank(
    State(state): State<FeatureState>,
    context: CallContext,
    Json(params): Json<ExportParams>,
) -> AppResult<ApiResponse<ExportOutput>> {
    let output = export::handle(&state, context.token(), params).await?;
    Ok(ApiResponse::success(output))
}

async fn get_status() -> ApiResponse<StatusReport> {
    ApiResponse::success(status::handle())
}
