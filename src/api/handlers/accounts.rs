//! Sign-up, login and logout.

use axum::{
    extract::{rejection::FormRejection, Query, State},
    response::Response,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use super::{accept_form, redirect_found};
use crate::api::auth::{safe_redirect_target, RequestContext, LOGIN_URL};
use crate::api::password::{hash_password, verify_password};
use crate::api::paths;
use crate::db::Database;
use crate::error::AppError;
use crate::models::*;

const INVALID_CREDENTIALS: &str =
    "please enter a correct username and password; both fields may be case-sensitive";

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupPage {
    pub form: SignupForm,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginPage {
    pub form: LoginForm,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutPage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn signup_page() -> Json<SignupPage> {
    Json(SignupPage {
        form: SignupForm::default(),
    })
}

pub async fn signup(
    State(db): State<Database>,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Result<Response, AppError> {
    let account = accept_form(form)?
        .validate()
        .map_err(AppError::InvalidForm)?;

    let NewAccount { username, password } = account;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::PasswordHashing(e.to_string()))??;

    let user = db.create_user(&username, &password_hash)?;
    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

    Ok(redirect_found(LOGIN_URL))
}

pub async fn login_page(Query(query): Query<NextQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        form: LoginForm {
            next: query.next,
            ..LoginForm::default()
        },
    })
}

pub async fn login(
    State(db): State<Database>,
    ctx: RequestContext,
    query: Query<NextQuery>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = accept_form(form)?;
    let invalid =
        || AppError::InvalidForm(FormErrors::single(FormErrors::NON_FIELD, INVALID_CREDENTIALS));

    let user = db
        .find_user_by_username(form.username.trim())?
        .ok_or_else(|| {
            tracing::debug!("Login attempt for unknown username");
            invalid()
        })?;

    let password = form.password;
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::PasswordHashing(e.to_string()))??;
    if !matches {
        tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    ctx.log_in(&user).await?;

    let next = form.next.or_else(|| query.0.next);
    let target = next
        .as_deref()
        .and_then(safe_redirect_target)
        .unwrap_or(paths::HOME);
    Ok(redirect_found(target))
}

pub async fn logout(ctx: RequestContext) -> Result<Json<LogoutPage>, AppError> {
    ctx.log_out().await?;
    Ok(Json(LogoutPage {
        message: "You have been logged out.".to_string(),
    }))
}
