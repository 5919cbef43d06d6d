use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched feed entry.
///
/// Articles are written by the fetcher (out of scope here) through
/// [`crate::db::Database::upsert_article`] and mutated only via rule
/// actions. The filter core treats them as read-only records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Opaque key assigned by the fetcher (typically the entry GUID).
    pub id: String,
    pub feed_id: String,
    pub title: String,
    pub link: String,
    pub author: String,
    pub content: String,
    pub categories: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub read: bool,
    pub starred: bool,
}
