mod auth;
mod handlers;
mod middleware;
mod password;

pub use auth::{login_url, safe_redirect_target, RequestContext, LOGIN_URL, SESSION_USER_ID_KEY};
pub use handlers::accounts::{LoginPage, LogoutPage, SignupPage};
pub use handlers::notes::{NoteFormPage, NoteListPage, NotePage, SuccessPage};
pub use handlers::HomePage;
pub use middleware::SESSION_COOKIE_NAME;
pub use password::{hash_password, verify_password};

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::Database;

/// Public URL paths.
pub mod paths {
    pub const HOME: &str = "/";
    pub const LIST: &str = "/notes/";
    pub const ADD: &str = "/add/";
    pub const SUCCESS: &str = "/done/";
    pub const SIGNUP: &str = "/auth/signup/";
    pub const LOGIN: &str = super::LOGIN_URL;
    pub const LOGOUT: &str = "/auth/logout/";

    pub fn detail(slug: &str) -> String {
        format!("/note/{slug}/")
    }

    pub fn edit(slug: &str) -> String {
        format!("/edit/{slug}/")
    }

    pub fn delete(slug: &str) -> String {
        format!("/delete/{slug}/")
    }
}

pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, &AppConfig::default())
}

pub fn create_router_with_config(db: Database, config: &AppConfig) -> Router {
    Router::new()
        .route(paths::HOME, get(handlers::home))
        .route("/health", get(handlers::health))
        // Accounts
        .route(
            paths::SIGNUP,
            get(handlers::accounts::signup_page).post(handlers::accounts::signup),
        )
        .route(
            paths::LOGIN,
            get(handlers::accounts::login_page).post(handlers::accounts::login),
        )
        .route(
            paths::LOGOUT,
            get(handlers::accounts::logout).post(handlers::accounts::logout),
        )
        // Notes
        .route(paths::LIST, get(handlers::notes::list_notes))
        .route(
            paths::ADD,
            get(handlers::notes::add_page).post(handlers::notes::add_note),
        )
        .route(paths::SUCCESS, get(handlers::notes::success))
        .route("/note/{slug}/", get(handlers::notes::detail))
        .route(
            "/edit/{slug}/",
            get(handlers::notes::edit_page).post(handlers::notes::edit_note),
        )
        .route(
            "/delete/{slug}/",
            get(handlers::notes::delete_page).post(handlers::notes::delete_note),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::session_layer(config)),
        )
        .with_state(db)
}
