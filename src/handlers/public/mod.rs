// handlers/public/mod.rs - endpoints reachable without a token
pub mod auth;

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::MaybeUser;
use crate::state::AppState;
use crate::{API_V1_PREFIX, VERSION};

/// GET / - service banner; echoes the caller's email when a valid token
/// is presented
pub async fn root(Extension(MaybeUser(user)): Extension<MaybeUser>) -> Json<Value> {
    let mut body = json!({
        "message": "Personal Health Records Manager API",
        "version": VERSION,
        "api_v1": API_V1_PREFIX,
    });
    if let Some(user) = user {
        body["user"] = json!(user.email);
    }
    Json(body)
}

/// GET /health - pings the database
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.db.health_check().await?;
    Ok(Json(json!({ "status": "healthy", "version": VERSION })))
}
