use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{HealthRecord, HealthRecordPatch, NewHealthRecord};
use crate::error::ApiError;
use crate::handlers::PageParams;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, Message};
use crate::services::HealthRecordQuery;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub record_type: Option<String>,
}

/// GET /api/v1/health-records - every record the caller owns, filtered
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<HealthRecord>> {
    let page = state.page(params.skip, params.limit);
    let query = HealthRecordQuery {
        search: params.search,
        record_type: params.record_type,
    };
    let records = state.health_records().search(user.id, query, page).await?;
    Ok(ApiResponse::success(records))
}

/// GET /api/v1/health-records/family-members/:member_id/records
pub async fn list_for_member(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(member_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<HealthRecord>> {
    let page = state.page(params.skip, params.limit);
    let records = state
        .health_records()
        .list_by_member(member_id, user.id, page)
        .await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/v1/health-records/family-members/:member_id/records
pub async fn post_for_member(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(member_id): Path<i64>,
    Json(new_record): Json<NewHealthRecord>,
) -> ApiResult<HealthRecord> {
    let record = state
        .health_records()
        .create(member_id, new_record, user.id)
        .await?;
    Ok(ApiResponse::created(record))
}

/// GET /api/v1/health-records/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<HealthRecord> {
    let record = state.health_records().get(id, user.id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/v1/health-records/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<HealthRecordPatch>,
) -> ApiResult<HealthRecord> {
    let record = state.health_records().update(id, patch, user.id).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/v1/health-records/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Message> {
    if !state.health_records().delete(id, user.id).await? {
        return Err(ApiError::not_found("Health record not found"));
    }
    Ok(ApiResponse::success(Message::new("Health record deleted successfully")))
}
