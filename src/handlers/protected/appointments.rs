use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{Appointment, AppointmentPatch, NewAppointment};
use crate::error::ApiError;
use crate::handlers::PageParams;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, Message};
use crate::services::AppointmentQuery;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// GET /api/v1/appointments
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Appointment>> {
    let page = state.page(params.skip, params.limit);
    let query = AppointmentQuery { status: params.status };
    let appointments = state.appointments().list(user.id, query, page).await?;
    Ok(ApiResponse::success(appointments))
}

/// GET /api/v1/health-records/family-members/:member_id/appointments
pub async fn list_for_member(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(member_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Appointment>> {
    let page = state.page(params.skip, params.limit);
    let appointments = state
        .appointments()
        .list_by_member(member_id, user.id, page)
        .await?;
    Ok(ApiResponse::success(appointments))
}

/// POST /api/v1/health-records/family-members/:member_id/appointments
pub async fn post_for_member(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(member_id): Path<i64>,
    Json(new_appointment): Json<NewAppointment>,
) -> ApiResult<Appointment> {
    let appointment = state
        .appointments()
        .create(member_id, new_appointment, user.id)
        .await?;
    Ok(ApiResponse::created(appointment))
}

/// GET /api/v1/appointments/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Appointment> {
    let appointment = state.appointments().get(id, user.id).await?;
    Ok(ApiResponse::success(appointment))
}

/// PUT /api/v1/appointments/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<AppointmentPatch>,
) -> ApiResult<Appointment> {
    let appointment = state.appointments().update(id, patch, user.id).await?;
    Ok(ApiResponse::success(appointment))
}

/// DELETE /api/v1/appointments/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Message> {
    if !state.appointments().delete(id, user.id).await? {
        return Err(ApiError::not_found("Appointment not found"));
    }
    Ok(ApiResponse::success(Message::new("Appointment deleted successfully")))
}
