//! Note pages. Every handler here requires a signed-in user; the
//! note-scoped ones additionally require that user to be the note's author.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::Response,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{accept_form, redirect_found};
use crate::api::auth::RequestContext;
use crate::api::paths;
use crate::db::Database;
use crate::error::AppError;
use crate::models::*;

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteListPage {
    pub object_list: Vec<Note>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteFormPage {
    pub form: NoteForm,
    /// The note being edited; absent on the add page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotePage {
    pub note: Note,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessPage {
    pub message: String,
}

pub async fn list_notes(
    State(db): State<Database>,
    ctx: RequestContext,
) -> Result<Json<NoteListPage>, AppError> {
    let user = ctx.require_user()?;
    let object_list = db.list_notes_by_author(user.id)?;
    Ok(Json(NoteListPage { object_list }))
}

pub async fn add_page(ctx: RequestContext) -> Result<Json<NoteFormPage>, AppError> {
    ctx.require_user()?;
    Ok(Json(NoteFormPage {
        form: NoteForm::default(),
        note: None,
    }))
}

pub async fn add_note(
    State(db): State<Database>,
    ctx: RequestContext,
    form: Result<Form<NoteForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;
    let new_note = accept_form(form)?
        .into_new_note()
        .map_err(AppError::InvalidForm)?;

    let note = db.create_note(user.id, new_note)?;
    tracing::info!(note_id = %note.id, slug = %note.slug, author_id = %user.id, "Note created");

    Ok(redirect_found(paths::SUCCESS))
}

pub async fn success(ctx: RequestContext) -> Result<Json<SuccessPage>, AppError> {
    ctx.require_user()?;
    Ok(Json(SuccessPage {
        message: "Done! Your changes have been saved.".to_string(),
    }))
}

pub async fn detail(
    State(db): State<Database>,
    ctx: RequestContext,
    Path(key): Path<String>,
) -> Result<Json<NotePage>, AppError> {
    let user = ctx.require_user()?;
    let note = owned_note(&db, user, &key)?;
    Ok(Json(NotePage { note }))
}

pub async fn edit_page(
    State(db): State<Database>,
    ctx: RequestContext,
    Path(key): Path<String>,
) -> Result<Json<NoteFormPage>, AppError> {
    let user = ctx.require_user()?;
    let note = owned_note(&db, user, &key)?;
    Ok(Json(NoteFormPage {
        form: NoteForm::from_note(&note),
        note: Some(note),
    }))
}

pub async fn edit_note(
    State(db): State<Database>,
    ctx: RequestContext,
    Path(key): Path<String>,
    form: Result<Form<NoteForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;
    let note = owned_note(&db, user, &key)?;
    let update = accept_form(form)?
        .into_update()
        .map_err(AppError::InvalidForm)?;

    db.update_note(user.id, note.id, update)?
        .ok_or(AppError::NotFound)?;
    tracing::info!(note_id = %note.id, slug = %note.slug, "Note updated");

    Ok(redirect_found(paths::SUCCESS))
}

pub async fn delete_page(
    State(db): State<Database>,
    ctx: RequestContext,
    Path(key): Path<String>,
) -> Result<Json<NotePage>, AppError> {
    let user = ctx.require_user()?;
    let note = owned_note(&db, user, &key)?;
    Ok(Json(NotePage { note }))
}

pub async fn delete_note(
    State(db): State<Database>,
    ctx: RequestContext,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;
    let note = owned_note(&db, user, &key)?;

    if !db.delete_note(user.id, note.id)? {
        return Err(AppError::NotFound);
    }
    tracing::info!(note_id = %note.id, slug = %note.slug, "Note deleted");

    Ok(redirect_found(paths::SUCCESS))
}

/// Load the note addressed by `key` (a slug, or a note id) on behalf of `user`.
///
/// A note owned by someone else yields [`AppError::NotOwner`], which is
/// answered exactly like a missing note.
fn owned_note(db: &Database, user: &User, key: &str) -> Result<Note, AppError> {
    let note = match db.find_note_by_slug(key)? {
        Some(note) => Some(note),
        None => match Uuid::parse_str(key) {
            Ok(id) => db.find_note_by_id(id)?,
            Err(_) => None,
        },
    };
    let note = note.ok_or(AppError::NotFound)?;

    if note.author_id != user.id {
        tracing::warn!(user_id = %user.id, slug = %note.slug, "Note requested by non-author");
        return Err(AppError::NotOwner);
    }
    Ok(note)
}
