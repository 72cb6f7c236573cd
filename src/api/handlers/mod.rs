pub mod accounts;
pub mod notes;

use axum::{
    extract::rejection::FormRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use super::auth::RequestContext;
use crate::error::AppError;

/// Landing page, open to everyone.
#[derive(Debug, Serialize, Deserialize)]
pub struct HomePage {
    pub title: String,
    /// Username of the signed-in visitor, if any.
    pub user: Option<String>,
}

pub async fn home(ctx: RequestContext) -> Json<HomePage> {
    Json(HomePage {
        title: "notekeeper".to_string(),
        user: ctx.current_user.map(|u| u.username),
    })
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `302 Found` to `location`.
pub(crate) fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Unwrap a decoded form, turning decoding failures into a 400.
pub(crate) fn accept_form<T>(form: Result<Form<T>, FormRejection>) -> Result<T, AppError> {
    form.map(|Form(value)| value)
        .map_err(|rejection| AppError::MalformedForm(rejection.body_text()))
}
