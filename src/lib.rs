pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod testing;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::state::AppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const API_V1_PREFIX: &str = "/api/v1";

/// Build the full router: public routes, the token-protected `/api/v1`
/// tree and the global CORS and trace layers.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .merge(root_routes(state.clone()))
        .route("/health", get(handlers::public::health))
        .nest(API_V1_PREFIX, public_api_routes().merge(protected_routes(state.clone())))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn root_routes(state: AppState) -> Router<AppState> {
    use crate::middleware::optional_auth;

    Router::new()
        .route("/", get(handlers::public::root))
        .route_layer(from_fn_with_state(state, optional_auth))
}

fn public_api_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/login/json", post(auth::login_json))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use crate::middleware::require_auth;
    use handlers::protected::{appointments, auth, family_members, health_records, medications, users};

    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/test-token", post(auth::test_token))
        // Users: self only
        .route("/users", get(users::list))
        .route("/users/:id", get(users::get).put(users::put).delete(users::delete))
        // Family members
        .route("/family-members", get(family_members::list).post(family_members::post))
        .route(
            "/family-members/:id",
            get(family_members::get)
                .put(family_members::put)
                .delete(family_members::delete),
        )
        // Records nested under a member
        .route(
            "/health-records/family-members/:member_id/records",
            get(health_records::list_for_member).post(health_records::post_for_member),
        )
        .route(
            "/health-records/family-members/:member_id/medications",
            get(medications::list_for_member).post(medications::post_for_member),
        )
        .route(
            "/health-records/family-members/:member_id/appointments",
            get(appointments::list_for_member).post(appointments::post_for_member),
        )
        // Records by id
        .route("/health-records", get(health_records::list))
        .route(
            "/health-records/:id",
            get(health_records::get)
                .put(health_records::put)
                .delete(health_records::delete),
        )
        .route("/medications", get(medications::list))
        .route(
            "/medications/:id",
            get(medications::get).put(medications::put).delete(medications::delete),
        )
        .route("/appointments", get(appointments::list))
        .route(
            "/appointments/:id",
            get(appointments::get).put(appointments::put).delete(appointments::delete),
        )
        .route_layer(from_fn_with_state(state, require_auth))
}

/// `*` in the configured origins allows any origin
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if security.cors_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::database::Database;

    async fn test_app() -> Router {
        let db = Database::in_memory().await.unwrap();
        app(AppState::new(AppConfig::for_tests(), db))
    }

    #[tokio::test]
    async fn protected_route_without_token_is_challenged() {
        let response = test_app()
            .await
            .oneshot(Request::get("/api/v1/family-members").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[tokio::test]
    async fn public_routes_need_no_token() {
        let app = test_app().await;
        for uri in ["/", "/health"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }
}
