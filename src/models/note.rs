use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::form::FormErrors;
use crate::slug::{self, SlugError};

/// Longest title a note may carry.
pub const TITLE_MAX_LENGTH: usize = 100;

/// A short text note owned by a single author.
///
/// The `slug` is the note's public address. It is unique across all notes
/// and never changes after creation, and neither does the `author_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated note ready to be written. The slug is already resolved.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub text: String,
    pub slug: String,
}

/// Validated changes to an existing note.
#[derive(Debug, Clone)]
pub struct UpdateNote {
    pub title: String,
    pub text: String,
}

/// Note form as submitted by the client.
///
/// Every field is optional at the decoding layer so that missing values are
/// reported as field errors instead of a decoding rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl NoteForm {
    /// Prefill the form with an existing note, as shown on the edit page.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: Some(note.slug.clone()),
        }
    }

    /// Validate a creation form and resolve its slug.
    pub fn into_new_note(self) -> Result<NewNote, FormErrors> {
        let mut errors = FormErrors::default();
        let title = validate_title(&self.title, &mut errors);
        let text = validate_text(&self.text, &mut errors);

        let slug = match slug::resolve_slug(&title, self.slug.as_deref()) {
            Ok(slug) => slug,
            // Without a title there is nothing to derive from; the title error says enough.
            Err(SlugError::Underivable) if title.is_empty() => String::new(),
            Err(err) => {
                errors.add("slug", err.to_string());
                String::new()
            }
        };

        errors.into_result(NewNote { title, text, slug })
    }

    /// Validate an edit form. The slug field, if any, is ignored.
    pub fn into_update(self) -> Result<UpdateNote, FormErrors> {
        let mut errors = FormErrors::default();
        let title = validate_title(&self.title, &mut errors);
        let text = validate_text(&self.text, &mut errors);
        errors.into_result(UpdateNote { title, text })
    }
}

fn validate_title(raw: &str, errors: &mut FormErrors) -> String {
    let title = raw.trim().to_string();
    if title.is_empty() {
        errors.add("title", "this field is required");
    } else if title.chars().count() > TITLE_MAX_LENGTH {
        errors.add(
            "title",
            format!("ensure this value has at most {TITLE_MAX_LENGTH} characters"),
        );
    }
    title
}

fn validate_text(raw: &str, errors: &mut FormErrors) -> String {
    if raw.trim().is_empty() {
        errors.add("text", "this field is required");
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, text: &str, slug: Option<&str>) -> NoteForm {
        NoteForm {
            title: title.to_string(),
            text: text.to_string(),
            slug: slug.map(str::to_string),
        }
    }

    #[test]
    fn derives_slug_when_absent() {
        let note = form("Заметка без slug", "body", None).into_new_note().unwrap();
        assert_eq!(note.slug, "zametka-bez-slug");
        assert_eq!(note.title, "Заметка без slug");
    }

    #[test]
    fn keeps_supplied_slug() {
        let note = form("Тестовая заметка", "body", Some("test_note"))
            .into_new_note()
            .unwrap();
        assert_eq!(note.slug, "test_note");
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = form("", " ", None).into_new_note().unwrap_err();
        assert!(errors.get("title").is_some());
        assert!(errors.get("text").is_some());
        assert!(errors.get("slug").is_none());
    }

    #[test]
    fn rejects_bad_slug_and_long_title() {
        let long_title = "x".repeat(TITLE_MAX_LENGTH + 1);
        let errors = form(&long_title, "body", Some("no spaces allowed"))
            .into_new_note()
            .unwrap_err();
        assert!(errors.get("title").is_some());
        assert!(errors.get("slug").is_some());
    }

    #[test]
    fn update_ignores_slug() {
        let update = form("New title", "New text", Some("not valid!"))
            .into_update()
            .unwrap();
        assert_eq!(update.title, "New title");
        assert_eq!(update.text, "New text");
    }
}
