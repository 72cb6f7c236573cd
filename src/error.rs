use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::error::Error as StdError;
use thiserror::Error;

use crate::api::login_url;
use crate::db::DbError;
use crate::models::FormErrors;

/// Request-boundary error. Every variant is scoped to one request/response
/// cycle; nothing here is retried or fatal to the process.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthenticated { next: String },

    #[error("note not found")]
    NotFound,

    /// Answered exactly like [`AppError::NotFound`].
    #[error("note belongs to another user")]
    NotOwner,

    #[error("{0} - such slug already exists, choose a unique value!")]
    DuplicateSlug(String),

    #[error("invalid form: {0}")]
    InvalidForm(FormErrors),

    #[error("malformed form submission: {0}")]
    MalformedForm(String),

    #[error("database error")]
    Database(#[source] DbError),

    #[error("session store error")]
    Session(#[from] tower_sessions::session::Error),

    #[error("session layer is not installed: {0}")]
    SessionUnavailable(&'static str),

    #[error("failed to hash password: {0}")]
    PasswordHashing(String),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct FormErrorResponse {
    errors: FormErrors,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated { .. } => StatusCode::FOUND,
            AppError::NotFound | AppError::NotOwner => StatusCode::NOT_FOUND,
            AppError::DuplicateSlug(_) | AppError::InvalidForm(_) | AppError::MalformedForm(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Database(_)
            | AppError::Session(_)
            | AppError::SessionUnavailable(_)
            | AppError::PasswordHashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log_error(&self, status: StatusCode) {
        match self {
            AppError::Unauthenticated { next } => {
                tracing::debug!(next = %next, "Anonymous request redirected to login");
            }
            AppError::NotOwner => {
                tracing::debug!(status_code = %status, "Access to another user's note rejected");
            }
            _ if status.is_client_error() => {
                tracing::warn!(error = %self, status_code = %status, "Client error");
            }
            _ => {
                tracing::error!(
                    error = %self,
                    status_code = %status,
                    source = ?self.source(),
                    "Server error"
                );
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.log_error(status);

        match self {
            AppError::Unauthenticated { next } => {
                (status, [(header::LOCATION, login_url(&next))]).into_response()
            }
            AppError::NotFound | AppError::NotOwner => (
                status,
                Json(ErrorResponse {
                    error: AppError::NotFound.to_string(),
                }),
            )
                .into_response(),
            AppError::DuplicateSlug(_) => {
                let errors = FormErrors::single("slug", self.to_string());
                (status, Json(FormErrorResponse { errors })).into_response()
            }
            AppError::InvalidForm(errors) => {
                (status, Json(FormErrorResponse { errors })).into_response()
            }
            AppError::MalformedForm(_) => (
                status,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
            _ => (
                status,
                Json(ErrorResponse {
                    error: "internal server error".to_string(),
                }),
            )
                .into_response(),
        }
    }
}

impl From<DbError> for AppError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::DuplicateSlug(slug) => AppError::DuplicateSlug(slug),
            DbError::DuplicateUsername(_) => AppError::InvalidForm(FormErrors::single(
                "username",
                "a user with that username already exists",
            )),
            other => AppError::Database(other),
        }
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(error: argon2::password_hash::Error) -> Self {
        AppError::PasswordHashing(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_owner_is_indistinguishable_from_not_found() {
        assert_eq!(AppError::NotOwner.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_owner_is_not_logged_as_a_warning() {
        let logs = crate::test_support::captured_logs(|| {
            AppError::NotOwner.into_response();
        });
        assert!(logs.contains("Access to another user's note rejected"));
        assert!(!logs.contains("WARN"));
    }

    #[test]
    fn duplicate_slug_is_a_client_error() {
        let error = AppError::from(DbError::DuplicateSlug("test_note".to_string()));
        assert!(matches!(error, AppError::DuplicateSlug(ref slug) if slug == "test_note"));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().starts_with("test_note - "));
    }

    #[test]
    fn duplicate_username_becomes_field_error() {
        let error = AppError::from(DbError::DuplicateUsername("user1".to_string()));
        match error {
            AppError::InvalidForm(errors) => assert!(errors.get("username").is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unauthenticated_redirects_to_login_with_next() {
        let response = AppError::Unauthenticated {
            next: "/notes/".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/notes/"
        );
    }

    #[test]
    fn sqlite_errors_are_server_errors() {
        let error = AppError::from(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
