//! Layers wrapped around every route.

use tower_sessions::{
    cookie::{time::Duration, SameSite},
    Expiry, MemoryStore, SessionManagerLayer,
};

use crate::config::AppConfig;

pub const SESSION_COOKIE_NAME: &str = "sessionid";

/// Upper bound on the configured session lifetime (ten years).
const MAX_SESSION_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Cookie session layer backed by an in-process store.
///
/// Sessions expire after `session_ttl` without requests and do not survive
/// a restart.
pub fn session_layer(config: &AppConfig) -> SessionManagerLayer<MemoryStore> {
    let ttl = i64::try_from(config.session_ttl.as_secs())
        .unwrap_or(MAX_SESSION_TTL_SECS)
        .min(MAX_SESSION_TTL_SECS);

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(ttl)))
}
