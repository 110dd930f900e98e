use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{Medication, MedicationPatch, NewMedication};
use crate::error::ApiError;
use crate::handlers::PageParams;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, Message};
use crate::services::MedicationQuery;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/v1/medications
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Medication>> {
    let page = state.page(params.skip, params.limit);
    let query = MedicationQuery {
        active_only: params.active_only,
    };
    let medications = state.medications().list(user.id, query, page).await?;
    Ok(ApiResponse::success(medications))
}

/// GET /api/v1/health-records/family-members/:member_id/medications
pub async fn list_for_member(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(member_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Medication>> {
    let page = state.page(params.skip, params.limit);
    let medications = state
        .medications()
        .list_by_member(member_id, user.id, page)
        .await?;
    Ok(ApiResponse::success(medications))
}

/// POST /api/v1/health-records/family-members/:member_id/medications
pub async fn post_for_member(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(member_id): Path<i64>,
    Json(new_medication): Json<NewMedication>,
) -> ApiResult<Medication> {
    let medication = state
        .medications()
        .create(member_id, new_medication, user.id)
        .await?;
    Ok(ApiResponse::created(medication))
}

/// GET /api/v1/medications/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Medication> {
    let medication = state.medications().get(id, user.id).await?;
    Ok(ApiResponse::success(medication))
}

/// PUT /api/v1/medications/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<MedicationPatch>,
) -> ApiResult<Medication> {
    let medication = state.medications().update(id, patch, user.id).await?;
    Ok(ApiResponse::success(medication))
}

/// DELETE /api/v1/medications/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Message> {
    if !state.medications().delete(id, user.id).await? {
        return Err(ApiError::not_found("Medication not found"));
    }
    Ok(ApiResponse::success(Message::new("Medication deleted successfully")))
}
