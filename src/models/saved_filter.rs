use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted, named condition sequence.
///
/// `conditions` is the versioned JSON blob produced by
/// [`crate::filter::codec::encode`]; the store validates it on every write
/// and otherwise treats it as opaque. `position` orders the saved-filter
/// list for display. Positions are a hint, not a key: duplicates are
/// tolerated and listing breaks ties by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: i64,
    pub name: String,
    pub conditions: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a saved filter. `conditions` arrives as a JSON
/// string. Fields default to empty so a missing field reports as a
/// validation error, not a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSavedFilterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: String,
}

/// Input for updating a saved filter's name and conditions. `position` is
/// only ever changed through reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSavedFilterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: String,
}

/// One entry of a reorder batch. Clients may send extra fields alongside
/// `id` and `position`; they are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: i64,
    pub position: i64,
}
