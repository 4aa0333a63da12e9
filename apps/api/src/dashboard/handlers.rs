//! Axum route handlers for the dashboard and résumé deletion API.

use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use crate::dashboard::controller::{BulkOutcome, DashboardView, DeleteReport, WipeReport};
use crate::dashboard::selection::SelectionState;
use crate::errors::AppError;
use crate::session::SessionToken;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub id: String,
    pub selected: bool,
    pub selection_state: SelectionState,
}

#[derive(Debug, Clone, Copy)]
enum BlobKind {
    Image,
    Resume,
}

impl BlobKind {
    fn label(self) -> &'static str {
        match self {
            BlobKind::Image => "image",
            BlobKind::Resume => "résumé",
        }
    }
}

/// GET /api/v1/dashboard
/// Loads on first access for the session.
pub async fn handle_get_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
) -> Json<DashboardView> {
    let mut dashboard = state.dashboards.wait(&session).await;
    if !dashboard.is_loaded() {
        dashboard.reload().await;
    }
    Json(dashboard.view())
}

/// POST /api/v1/dashboard/reload
pub async fn handle_reload(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = state.dashboards.claim(&session)?;
    dashboard.reload().await;
    Ok(Json(dashboard.view()))
}

/// POST /api/v1/dashboard/selection/:id/toggle
pub async fn handle_toggle(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let mut dashboard = state.dashboards.claim(&session)?;
    let selected = dashboard.toggle(&id)?;
    Ok(Json(ToggleResponse {
        id,
        selected,
        selection_state: dashboard.view().selection_state,
    }))
}

/// POST /api/v1/dashboard/selection/toggle-all
pub async fn handle_toggle_all(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = state.dashboards.claim(&session)?;
    dashboard.toggle_all();
    Ok(Json(dashboard.view()))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_one(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<Json<DeleteReport>, AppError> {
    let mut dashboard = state.dashboards.claim(&session)?;
    Ok(Json(dashboard.delete_one(&id).await?))
}

/// POST /api/v1/resumes/delete-selected
pub async fn handle_delete_selected(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
) -> Result<Json<BulkOutcome>, AppError> {
    let mut dashboard = state.dashboards.claim(&session)?;
    Ok(Json(dashboard.delete_selected().await?))
}

/// DELETE /api/v1/resumes
pub async fn handle_delete_all(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
) -> Result<Json<WipeReport>, AppError> {
    let mut dashboard = state.dashboards.claim(&session)?;
    Ok(Json(dashboard.delete_all().await?))
}

/// GET /api/v1/resumes/:id/image
pub async fn handle_get_image(
    state: State<AppState>,
    session: Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    read_record_blob(state, session, id, BlobKind::Image).await
}

/// GET /api/v1/resumes/:id/resume
pub async fn handle_get_resume(
    state: State<AppState>,
    session: Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    read_record_blob(state, session, id, BlobKind::Resume).await
}

async fn read_record_blob(
    State(state): State<AppState>,
    Extension(session): Extension<SessionToken>,
    id: String,
    kind: BlobKind,
) -> Result<impl IntoResponse, AppError> {
    // Resolve the path under the lock, read the blob without it.
    let path = {
        let dashboard = state.dashboards.wait(&session).await;
        let record = dashboard
            .record(&id)
            .ok_or_else(|| AppError::NotFound(format!("Record {id} is not loaded")))?;
        let (image, resume) = record.blob_paths();
        let path = match kind {
            BlobKind::Image => image,
            BlobKind::Resume => resume,
        };
        path.map(String::from)
            .ok_or_else(|| AppError::NotFound(format!("Record {id} has no {} file", kind.label())))?
    };

    let bytes = state.files.read_blob(&path).await?;
    Ok(([(CONTENT_TYPE, content_type_for(&path))], bytes))
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
