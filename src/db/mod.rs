mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;

use crate::filter::codec::{self, CodecError};
use crate::models::*;
use crate::rules::{ActionExecutor, ArticleSource};

/// Store-level error taxonomy. The API layer maps each variant to a status
/// code; everything not listed here reaches clients as a sanitized 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    /// Name uniqueness is enforced by the schema, not by a pre-read, so
    /// concurrent creates cannot both slip past a check.
    #[error("a saved filter named \"{0}\" already exists")]
    Conflict(String),

    #[error("saved filter {0} not found")]
    NotFound(i64),

    /// A client handed us a conditions payload the codec rejects.
    #[error("invalid conditions payload: {0}")]
    InvalidConditions(#[source] CodecError),

    /// A persisted conditions blob no longer decodes. Surfaced as a
    /// data-integrity failure instead of silently treating the filter as
    /// empty.
    #[error("saved filter {id} has a corrupt conditions payload")]
    Corrupt {
        id: i64,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

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
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "newshound")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("newshound.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Saved filter operations
    // ============================================================

    pub fn list_saved_filters(&self) -> StoreResult<Vec<SavedFilter>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, conditions, position, created_at, updated_at
             FROM saved_filters ORDER BY position, id",
        )?;

        let filters = stmt
            .query_map([], |row| {
                Ok(SavedFilter {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    conditions: row.get(2)?,
                    position: row.get(3)?,
                    created_at: parse_datetime(row.get::<_, String>(4)?),
                    updated_at: parse_datetime(row.get::<_, String>(5)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(filters)
    }

    pub fn get_saved_filter(&self, id: i64) -> StoreResult<Option<SavedFilter>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, conditions, position, created_at, updated_at
             FROM saved_filters WHERE id = ?",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(SavedFilter {
                id: row.get(0)?,
                name: row.get(1)?,
                conditions: row.get(2)?,
                position: row.get(3)?,
                created_at: parse_datetime(row.get::<_, String>(4)?),
                updated_at: parse_datetime(row.get::<_, String>(5)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn create_saved_filter(&self, input: CreateSavedFilterInput) -> StoreResult<SavedFilter> {
        let conditions = normalize_conditions(&input.conditions)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();

        // The lock serializes writers, so MAX+1 cannot race with another
        // create on this handle.
        let position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM saved_filters",
            [],
            |row| row.get(0),
        )?;

        let inserted = conn.execute(
            "INSERT INTO saved_filters (name, conditions, position, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                &input.name,
                &conditions,
                position,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        );

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::Conflict(input.name));
            }
            Err(err) => return Err(err.into()),
        }

        Ok(SavedFilter {
            id: conn.last_insert_rowid(),
            name: input.name,
            conditions,
            position,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_saved_filter(&self, id: i64, input: UpdateSavedFilterInput) -> StoreResult<()> {
        let conditions = normalize_conditions(&input.conditions)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();

        let rows = conn
            .execute(
                "UPDATE saved_filters SET name = ?, conditions = ?, updated_at = ? WHERE id = ?",
                (&input.name, &conditions, now.to_rfc3339(), id),
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::Conflict(input.name.clone())
                } else {
                    err.into()
                }
            })?;

        if rows == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Deleting an absent id is not an error at this layer.
    pub fn delete_saved_filter(&self, id: i64) -> StoreResult<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM saved_filters WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    /// Applies a whole reorder batch in one transaction. Any unknown id
    /// rolls the batch back; no partial reorder is ever observable.
    pub fn reorder_saved_filters(&self, entries: &[ReorderEntry]) -> StoreResult<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        for entry in entries {
            let rows = tx.execute(
                "UPDATE saved_filters SET position = ? WHERE id = ?",
                (entry.position, entry.id),
            )?;
            if rows == 0 {
                // Dropping the open transaction rolls everything back.
                return Err(StoreError::NotFound(entry.id));
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Decodes a stored conditions blob for replay. A row that no longer
    /// parses is reported as corrupt, not treated as an empty filter.
    pub fn load_saved_filter_conditions(&self, id: i64) -> StoreResult<Vec<Condition>> {
        let filter = self
            .get_saved_filter(id)?
            .ok_or(StoreError::NotFound(id))?;

        codec::decode(&filter.conditions).map_err(|source| StoreError::Corrupt { id, source })
    }

    // ============================================================
    // Article operations
    // ============================================================

    /// Ingestion seam for the fetcher. Replaces the stored row wholesale.
    pub fn upsert_article(&self, article: &Article) -> StoreResult<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let categories =
            serde_json::to_string(&article.categories).unwrap_or_else(|_| "[]".to_string());

        conn.execute(
            "INSERT OR REPLACE INTO articles
             (id, feed_id, title, link, author, content, categories, published_at, is_read, is_starred)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &article.id,
                &article.feed_id,
                &article.title,
                &article.link,
                &article.author,
                &article.content,
                categories,
                article.published_at.to_rfc3339(),
                article.read as i32,
                article.starred as i32,
            ),
        )?;

        Ok(())
    }

    /// Full corpus in display order: newest first, id as the tie-break so
    /// sequential page fetches under an active filter stay stable.
    pub fn list_articles(&self) -> StoreResult<Vec<Article>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, feed_id, title, link, author, content, categories, published_at, is_read, is_starred
             FROM articles ORDER BY published_at DESC, id DESC",
        )?;

        let articles = stmt
            .query_map([], row_to_article)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    pub fn get_article(&self, id: &str) -> StoreResult<Option<Article>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, feed_id, title, link, author, content, categories, published_at, is_read, is_starred
             FROM articles WHERE id = ?",
        )?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row_to_article(row)?))
        } else {
            Ok(None)
        }
    }
}

impl ArticleSource for Database {
    fn articles(&self) -> anyhow::Result<Vec<Article>> {
        Ok(self.list_articles()?)
    }
}

impl ActionExecutor for Database {
    fn execute(&self, article_id: &str, action: &Action) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let rows = match action.kind {
            ActionKind::MarkRead => {
                conn.execute("UPDATE articles SET is_read = 1 WHERE id = ?", [article_id])?
            }
            ActionKind::MarkUnread => {
                conn.execute("UPDATE articles SET is_read = 0 WHERE id = ?", [article_id])?
            }
            ActionKind::Star => conn.execute(
                "UPDATE articles SET is_starred = 1 WHERE id = ?",
                [article_id],
            )?,
            ActionKind::Unstar => conn.execute(
                "UPDATE articles SET is_starred = 0 WHERE id = ?",
                [article_id],
            )?,
            ActionKind::Delete => {
                conn.execute("DELETE FROM articles WHERE id = ?", [article_id])?
            }
            ActionKind::Relabel => {
                let category = action
                    .parameters
                    .get("category")
                    .and_then(|value| value.as_str())
                    .ok_or_else(|| anyhow::anyhow!("relabel needs a \"category\" parameter"))?;
                let categories = serde_json::to_string(&[category])?;
                conn.execute(
                    "UPDATE articles SET categories = ? WHERE id = ?",
                    (categories, article_id),
                )?
            }
        };

        if rows == 0 {
            anyhow::bail!("article {article_id} not found");
        }
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Re-encodes client-supplied conditions into the canonical blob, rejecting
/// payloads the codec cannot read and sequences with nothing to evaluate.
fn normalize_conditions(raw: &str) -> StoreResult<String> {
    let conditions = codec::decode(raw).map_err(StoreError::InvalidConditions)?;
    if conditions.is_empty() {
        return Err(StoreError::Validation(
            "a saved filter needs at least one condition".to_string(),
        ));
    }
    Ok(codec::encode(&conditions))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn row_to_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    let categories: String = row.get(6)?;
    Ok(Article {
        id: row.get(0)?,
        feed_id: row.get(1)?,
        title: row.get(2)?,
        link: row.get(3)?,
        author: row.get(4)?,
        content: row.get(5)?,
        categories: serde_json::from_str(&categories).unwrap_or_default(),
        published_at: parse_datetime(row.get::<_, String>(7)?),
        read: row.get::<_, i32>(8)? != 0,
        starred: row.get::<_, i32>(9)? != 0,
    })
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
