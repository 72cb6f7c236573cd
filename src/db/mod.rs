mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;

/// Storage failures the request layer needs to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("a note with slug '{0}' already exists")]
    DuplicateSlug(String),
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

const NOTE_COLUMNS: &str = "id, title, text, slug, author_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, password_hash, created_at";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        schema::run_migrations(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-applied statement behind.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================
    // User operations
    // ============================================================

    pub fn create_user(&self, username: &str, password_hash: &str) -> DbResult<User> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
            (id.to_string(), username, password_hash, now.to_rfc3339()),
        )
        .map_err(|e| {
            if unique_violation(&e, "users.username") {
                DbError::DuplicateUsername(username.to_string())
            } else {
                DbError::Sqlite(e)
            }
        })?;

        Ok(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        })
    }

    pub fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        let conn = self.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                [id.to_string()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let conn = self.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
                [username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    // ============================================================
    // Note operations
    // ============================================================

    /// Insert a note owned by `author_id`.
    ///
    /// Slug uniqueness is left to the `UNIQUE` index so that two concurrent
    /// creates with the same slug cannot both succeed.
    pub fn create_note(&self, author_id: Uuid, input: NewNote) -> DbResult<Note> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO notes (id, title, text, slug, author_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.title,
                &input.text,
                &input.slug,
                author_id.to_string(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )
        .map_err(|e| {
            if unique_violation(&e, "notes.slug") {
                DbError::DuplicateSlug(input.slug.clone())
            } else {
                DbError::Sqlite(e)
            }
        })?;

        Ok(Note {
            id,
            title: input.title,
            text: input.text,
            slug: input.slug,
            author_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn find_note_by_slug(&self, slug: &str) -> DbResult<Option<Note>> {
        let conn = self.lock();
        Ok(query_note(&conn, "slug = ?", &slug)?)
    }

    pub fn find_note_by_id(&self, id: Uuid) -> DbResult<Option<Note>> {
        let conn = self.lock();
        Ok(query_note(&conn, "id = ?", &id.to_string())?)
    }

    pub fn list_notes_by_author(&self, author_id: Uuid) -> DbResult<Vec<Note>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE author_id = ? ORDER BY created_at, rowid"
        ))?;

        let notes = stmt
            .query_map([author_id.to_string()], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    /// Apply `input` to the note, provided `author_id` owns it.
    ///
    /// Returns `None` when no note with that id belongs to the author.
    pub fn update_note(
        &self,
        author_id: Uuid,
        note_id: Uuid,
        input: UpdateNote,
    ) -> DbResult<Option<Note>> {
        let conn = self.lock();
        let rows = conn.execute(
            "UPDATE notes SET title = ?, text = ?, updated_at = ? WHERE id = ? AND author_id = ?",
            (
                &input.title,
                &input.text,
                Utc::now().to_rfc3339(),
                note_id.to_string(),
                author_id.to_string(),
            ),
        )?;

        if rows == 0 {
            return Ok(None);
        }
        Ok(query_note(&conn, "id = ?", &note_id.to_string())?)
    }

    /// Permanently remove the note, provided `author_id` owns it.
    pub fn delete_note(&self, author_id: Uuid, note_id: Uuid) -> DbResult<bool> {
        let conn = self.lock();
        let rows = conn.execute(
            "DELETE FROM notes WHERE id = ? AND author_id = ?",
            (note_id.to_string(), author_id.to_string()),
        )?;
        Ok(rows > 0)
    }

    pub fn count_notes(&self) -> DbResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count.try_into().unwrap_or_default())
    }
}

fn default_path() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "notekeeper")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("notekeeper.db"))
}

fn query_note(
    conn: &Connection,
    predicate: &str,
    value: &dyn rusqlite::ToSql,
) -> rusqlite::Result<Option<Note>> {
    conn.query_row(
        &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE {predicate}"),
        &[value],
        note_from_row,
    )
    .optional()
}

fn unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(message)) => {
            e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message.contains(column)
        }
        _ => false,
    }
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: uuid_column(row, 0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        slug: row.get(3)?,
        author_id: uuid_column(row, 4)?,
        created_at: datetime_column(row, 5)?,
        updated_at: datetime_column(row, 6)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_column(row, 0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: datetime_column(row, 3)?,
    })
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
