//! Router assembly. Every tenant-scoped API is mounted twice: bare `/api/*`
//! and tenant-prefixed `/t/:tenant_prefix/api/*`. Handlers never read the
//! prefix capture directly; tenant resolution parses the request URI.

use crate::handlers::{auth, common, contributions, global, public_dir, reports, users};
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(common::health))
        // auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile).put(auth::update_profile))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/pending", get(auth::pending_users))
        .route("/auth/approve/:id", post(auth::approve_user))
        .route("/auth/reject/:id", post(auth::reject_user))
        // users
        .route("/users", get(users::list))
        .route(
            "/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        // contributions
        .route(
            "/contributions",
            get(contributions::list).post(contributions::create),
        )
        .route(
            "/contributions/:id",
            get(contributions::get)
                .put(contributions::update)
                .delete(contributions::delete),
        )
        .route("/contributions/:id/submit", post(contributions::submit))
        .route("/contributions/:id/approve", post(contributions::approve))
        .route("/contributions/:id/reject", post(contributions::reject))
        // reports
        .route("/reports/dashboard", get(reports::dashboard))
        .route("/reports/timeline", get(reports::timeline))
        .route("/reports/comprehensive", get(reports::comprehensive))
        .route("/reports/export", post(reports::export))
        // global admin (not tenant scoped; mounted here so both prefixes work)
        .route("/global/login", post(global::login))
        .route(
            "/global/tenants",
            get(global::list_tenants).post(global::create_tenant),
        )
        .route(
            "/global/tenants/:id",
            put(global::update_tenant).delete(global::delete_tenant),
        )
        .route("/global/users", get(global::list_users))
        .route("/global/contributions", get(global::list_contributions))
        .route("/global/overview", get(global::overview))
        // public directory
        .route("/public/tenants", get(public_dir::tenants))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(common::root))
        .nest("/api", api_routes())
        .nest("/t/:tenant_prefix/api", api_routes())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
