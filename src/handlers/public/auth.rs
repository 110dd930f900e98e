// handlers/public/auth.rs - registration and token acquisition
use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};

use crate::database::models::{NewUser, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// OAuth2 password-grant form; `username` carries the email
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginJson {
    pub email: String,
    pub password: String,
}

/// Sent bare (no success envelope) so OAuth2 clients can read it directly
#[derive(Debug, Serialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// POST /api/v1/auth/register
pub async fn register(State(state): State<AppState>, Json(new_user): Json<NewUser>) -> ApiResult<User> {
    let user = state.users().create(new_user).await?;
    Ok(ApiResponse::created(user))
}

/// POST /api/v1/auth/login (form encoded)
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Json<Token>, ApiError> {
    issue_for_credentials(&state, &form.username, &form.password).await
}

/// POST /api/v1/auth/login/json
pub async fn login_json(State(state): State<AppState>, Json(body): Json<LoginJson>) -> Result<Json<Token>, ApiError> {
    issue_for_credentials(&state, &body.email, &body.password).await
}

async fn issue_for_credentials(state: &AppState, email: &str, password: &str) -> Result<Json<Token>, ApiError> {
    let user = match state.users().authenticate(email, password).await? {
        Some(user) => user,
        None => {
            tracing::warn!("Failed login attempt");
            return Err(ApiError::unauthorized("Incorrect email or password"));
        }
    };

    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }

    let access_token = state.tokens.issue(user.id)?;
    tracing::info!("Issued access token for user {}", user.id);

    Ok(Json(Token {
        access_token,
        token_type: "bearer",
        expires_in: state.tokens.expires_in_seconds(),
    }))
}
