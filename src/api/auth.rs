//! Session-backed request identity.
//!
//! [`RequestContext`] is extracted for every handler that cares about the
//! visitor. Protected handlers call [`RequestContext::require_user`], which
//! turns an anonymous visit into a redirect to the login page carrying the
//! original path in `next`.

use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::request::Parts,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::db::Database;
use crate::error::AppError;
use crate::models::User;

/// Session key holding the signed-in user's id.
pub const SESSION_USER_ID_KEY: &str = "user_id";

pub const LOGIN_URL: &str = "/auth/login/";

/// Who is making the request, resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub current_user: Option<User>,
    /// Path and query of the request, used as the post-login return target.
    pub path: String,
    session: Session,
}

impl RequestContext {
    /// The signed-in user, or [`AppError::Unauthenticated`] for anonymous visitors.
    pub fn require_user(&self) -> Result<&User, AppError> {
        self.current_user
            .as_ref()
            .ok_or_else(|| AppError::Unauthenticated {
                next: self.path.clone(),
            })
    }

    /// Bind the session to `user`, issuing a fresh session id.
    pub async fn log_in(&self, user: &User) -> Result<(), AppError> {
        self.session.cycle_id().await?;
        self.session.insert(SESSION_USER_ID_KEY, user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(())
    }

    pub async fn log_out(&self) -> Result<(), AppError> {
        if let Some(user) = &self.current_user {
            tracing::info!(user_id = %user.id, "User logged out");
        }
        self.session.flush().await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    Database: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::SessionUnavailable(message))?;

        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        let current_user = match session.get::<Uuid>(SESSION_USER_ID_KEY).await? {
            Some(user_id) => {
                let db = Database::from_ref(state);
                let user = db.find_user_by_id(user_id)?;
                if user.is_none() {
                    tracing::debug!(user_id = %user_id, "Session refers to a missing user");
                }
                user
            }
            None => None,
        };

        Ok(Self {
            current_user,
            path,
            session,
        })
    }
}

/// Login page URL that sends the visitor back to `next` afterwards.
///
/// Each path segment of `next` is percent-encoded; the `/` separators stay literal.
pub fn login_url(next: &str) -> String {
    let encoded: Vec<_> = next.split('/').map(urlencoding::encode).collect();
    format!("{LOGIN_URL}?next={}", encoded.join("/"))
}

/// `next` if it is a path on this site, otherwise `None`.
///
/// Rejects absolute and protocol-relative URLs so the login form cannot be
/// used as an open redirect.
pub fn safe_redirect_target(next: &str) -> Option<&str> {
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && next.bytes().all(|b| b.is_ascii_graphic());
    local.then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_keeps_slashes_in_next() {
        assert_eq!(login_url("/notes/"), "/auth/login/?next=/notes/");
        assert_eq!(
            login_url("/edit/test_note/"),
            "/auth/login/?next=/edit/test_note/"
        );
    }

    #[test]
    fn login_url_encodes_query_characters() {
        assert_eq!(
            login_url("/notes/?page=2&x=y"),
            "/auth/login/?next=/notes/%3Fpage%3D2%26x%3Dy"
        );
        assert_eq!(login_url("/note/é/"), "/auth/login/?next=/note/%C3%A9/");
    }

    #[test]
    fn only_local_paths_are_safe_redirects() {
        assert_eq!(safe_redirect_target("/notes/"), Some("/notes/"));
        assert_eq!(safe_redirect_target("https://evil.example/"), None);
        assert_eq!(safe_redirect_target("//evil.example/"), None);
        assert_eq!(safe_redirect_target("/\\evil.example"), None);
        assert_eq!(safe_redirect_target("/with space"), None);
        assert_eq!(safe_redirect_target(""), None);
    }
}
