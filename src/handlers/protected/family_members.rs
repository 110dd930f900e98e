use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{FamilyMember, FamilyMemberDetail, FamilyMemberPatch, NewFamilyMember};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, Message};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// GET /api/v1/family-members
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<FamilyMember>> {
    let page = state.page(params.skip, params.limit);
    let members = state
        .family_members()
        .list(user.id, params.search.as_deref(), page)
        .await?;
    Ok(ApiResponse::success(members))
}

/// POST /api/v1/family-members
pub async fn post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(new_member): Json<NewFamilyMember>,
) -> ApiResult<FamilyMember> {
    let member = state.family_members().create(new_member, user.id).await?;
    Ok(ApiResponse::created(member))
}

/// GET /api/v1/family-members/:id - the member with all attached records
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<FamilyMemberDetail> {
    let detail = state.family_members().get_with_records(id, user.id).await?;
    Ok(ApiResponse::success(detail))
}

/// PUT /api/v1/family-members/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<FamilyMemberPatch>,
) -> ApiResult<FamilyMember> {
    let member = state.family_members().update(id, patch, user.id).await?;
    Ok(ApiResponse::success(member))
}

/// DELETE /api/v1/family-members/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Message> {
    if !state.family_members().delete(id, user.id).await? {
        return Err(ApiError::not_found("Family member not found"));
    }
    Ok(ApiResponse::success(Message::new("Family member deleted successfully")))
}
