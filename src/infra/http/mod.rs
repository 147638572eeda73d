//! REST delivery: router, shared state, auth and logging middleware.

mod auth;
pub mod error;
mod handlers;
mod middleware;

pub use auth::Viewer;
pub use error::{ApiError, codes};
pub use middleware::RequestContext;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::application::{auth::TokenIssuer, blogs::BlogService, users::UserService};
use crate::infra::db::PostgresRepositories;

use self::handlers::{blogs, health, users};
use self::middleware::{log_responses, request_timeout, set_request_context};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub blogs: BlogService,
    pub tokens: Arc<dyn TokenIssuer>,
    /// Absent when the services run against non-Postgres stores.
    pub db: Option<PostgresRepositories>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(users: UserService, blogs: BlogService, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            users,
            blogs,
            tokens,
            db: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_database(mut self, db: PostgresRepositories) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/ping", get(health::ping))
        .route("/health/db", get(health::db_health))
        .route("/api/u/new", post(users::register))
        .route("/api/u/{id}", get(users::get_user))
        .route("/api/u/by-name/{username}", get(users::get_user_by_username))
        .route("/api/u/{id}/following", get(users::list_following))
        .route("/api/u/{id}/follows", get(users::list_followers))
        .route("/api/b", get(blogs::list_blogs))
        .route("/api/b/{id}/likes", get(blogs::list_likers));

    let viewer_aware = Router::new()
        .route("/api/b/{id}", get(blogs::get_blog))
        .route_layer(from_fn_with_state(state.clone(), auth::optional_auth));

    let protected = Router::new()
        .route("/api/u/{id}", post(users::follow_action))
        .route("/api/u/{id}/manage", post(users::update_profile))
        .route("/api/b/new", post(blogs::create_blog))
        .route("/api/b/{id}", post(blogs::like_action))
        .route("/api/b/{id}/edit", post(blogs::update_blog))
        .route("/api/b/{id}/delete", post(blogs::delete_blog))
        .route_layer(from_fn_with_state(state.clone(), auth::require_auth));

    let timeout = state.request_timeout;

    public
        .merge(viewer_aware)
        .merge(protected)
        .with_state(state)
        .layer(from_fn_with_state(timeout, request_timeout))
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
}
