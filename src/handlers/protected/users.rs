use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::database::models::{User, UserPatch};
use crate::error::ApiError;
use crate::handlers::PageParams;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, Message};
use crate::state::AppState;

const NOT_FOUND: &str = "User not found";

/// GET /api/v1/users - superusers only
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<User>> {
    if !current.is_superuser {
        return Err(ApiError::forbidden("Not enough permissions"));
    }
    let users = state.users().list(state.page(params.skip, params.limit)).await?;
    Ok(ApiResponse::success(users))
}

/// GET /api/v1/users/:id - only the caller's own id resolves
pub async fn get(
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<User> {
    if id != current.id {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    Ok(ApiResponse::success(current))
}

/// PUT /api/v1/users/:id - setting `is_active: false` locks the account;
/// it cannot be undone through the API
pub async fn put(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<User> {
    if id != current.id {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    if patch.is_active == Some(false) {
        tracing::info!("User {} is deactivating their account", id);
    }

    let user = state
        .users()
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/v1/users/:id - removes the account and everything it owns
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Message> {
    if id != current.id || !state.users().delete(id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    Ok(ApiResponse::success(Message::new("User deleted successfully")))
}
