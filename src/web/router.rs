//! Axum router construction.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::web::handlers;
use crate::web::state::SharedState;
use crate::web::utils::api_error;

/// Build the complete router: every API route under `/api`, a JSON 404
/// fallback, CORS for the browser client, and request tracing.
pub fn build_router(state: SharedState, client_origin: &str) -> Router {
    let api = Router::new()
        // Health
        .route("/health", get(handlers::health::health_handler))
        // Auth
        .route("/auth/github", get(handlers::auth::github_login_handler))
        .route(
            "/auth/github/callback",
            get(handlers::auth::github_callback_handler),
        )
        // Follows
        .route(
            "/follows/:userId",
            post(handlers::follows::follow_handler).delete(handlers::follows::unfollow_handler),
        )
        // Posts
        .route(
            "/posts",
            get(handlers::posts::feed_handler).post(handlers::posts::create_post_handler),
        )
        .route("/posts/explore", get(handlers::posts::explore_handler))
        .route(
            "/posts/user/:userId",
            get(handlers::posts::list_by_author_handler),
        )
        .route(
            "/posts/:postId",
            get(handlers::posts::get_post_handler).delete(handlers::posts::delete_post_handler),
        )
        .route(
            "/posts/:postId/like",
            post(handlers::posts::like_handler).delete(handlers::posts::unlike_handler),
        )
        // Profiles
        .route(
            "/profile/me",
            get(handlers::profile::get_own_profile_handler)
                .patch(handlers::profile::update_own_profile_handler),
        )
        .route(
            "/profile/:username",
            get(handlers::profile::get_profile_handler),
        )
        .route(
            "/profile/:username/followers",
            get(handlers::profile::followers_handler),
        )
        .route(
            "/profile/:username/following",
            get(handlers::profile::following_handler),
        )
        // Users
        .route("/users", get(handlers::users::list_users_handler));

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(cors_layer(client_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> Response {
    api_error(StatusCode::NOT_FOUND, "Not found")
}

fn cors_layer(client_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);
    match HeaderValue::from_str(client_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(origin = client_origin, "client origin is not a valid header value; CORS disabled");
            cors
        }
    }
}
