use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, TokenService};
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::{ServiceError, UserService};
use crate::state::AppState;

/// The authenticated, active user behind the request
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Identity for optional-auth routes; any resolution failure leaves it empty
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<User>);

/// Turns a presented credential into a user.
///
/// Every failure up to the account lookup collapses into
/// `AuthError::Unauthenticated`, so a bad signature, an expired token and a
/// deleted user all look the same from outside.
pub struct Authenticator {
    tokens: TokenService,
    users: UserService,
}

impl Authenticator {
    pub fn new(tokens: TokenService, users: UserService) -> Self {
        Self { tokens, users }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.tokens.clone(), state.users())
    }

    pub async fn resolve(&self, credential: Option<&str>) -> Result<User, ServiceError> {
        let token = credential.ok_or(AuthError::Unauthenticated)?;

        let user_id = self.tokens.verify(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AuthError::Unauthenticated
        })?;

        let user = match self.users.find_by_id(user_id).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Token subject {} does not exist", user_id);
                return Err(AuthError::Unauthenticated.into());
            }
        };

        if !user.is_active {
            tracing::warn!("Inactive user {} presented a valid token", user.id);
            return Err(AuthError::InactiveAccount.into());
        }

        tracing::debug!("Resolved request to user {}", user.id);
        Ok(user)
    }

    pub async fn resolve_optional(&self, credential: Option<&str>) -> Option<User> {
        credential?;
        self.resolve(credential).await.ok()
    }
}

/// Requires a valid bearer token and inserts [`CurrentUser`]
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers);
    let user = Authenticator::from_state(&state).resolve(token).await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Inserts [`MaybeUser`] and never rejects the request
pub async fn optional_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_jwt_from_headers(&headers);
    let user = Authenticator::from_state(&state).resolve_optional(token).await;

    request.extensions_mut().insert(MaybeUser(user));
    next.run(request).await
}

/// Extract the bearer token from the Authorization header. The scheme is
/// matched case-insensitively; anything else counts as no credential.
pub fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth_str.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
