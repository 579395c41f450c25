use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::entry::{DailyEntry, DeleteResponse, EntryRequest};
use crate::services::{entries, stats};
use crate::AppState;

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<EntryRequest>, AppError>,
) -> AppResult<Json<DailyEntry>> {
    let entry = entries::create_entry(&state.db, &state.analyzer, &auth_user.username, body).await?;
    Ok(Json(entry))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<DailyEntry>>> {
    let entries = entries::list_entries(&state.db, &auth_user.username).await?;
    Ok(Json(entries))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Path(entry_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(body), _): WithRejection<Json<EntryRequest>, AppError>,
) -> AppResult<Json<DailyEntry>> {
    let entry = entries::update_entry(
        &state.db,
        &state.analyzer,
        &auth_user.username,
        entry_id,
        body,
    )
    .await?;
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Path(entry_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<DeleteResponse>> {
    entries::delete_entry(&state.db, &auth_user.username, entry_id).await?;
    Ok(Json(DeleteResponse {
        deleted: true,
        id: entry_id,
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<stats::JournalStats>> {
    let entries = entries::list_entries(&state.db, &auth_user.username).await?;
    Ok(Json(stats::compute_stats(&entries)))
}
