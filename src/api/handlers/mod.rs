use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::{Database, StoreError};
use crate::filter;
use crate::models::*;
use crate::rules::{CancelToken, RuleEngine, RuleError};

// ============================================================
// Error Handling
// ============================================================

/// Maps the store taxonomy onto status codes. Client mistakes keep their
/// message; internal failures are logged server-side and sanitized.
fn store_error(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::Validation(_) | StoreError::InvalidConditions(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        StoreError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::Corrupt { .. } => {
            tracing::error!("Data integrity error: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        StoreError::Sqlite(_) => {
            tracing::error!("Internal error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn status_ok() -> serde_json::Value {
    serde_json::json!({ "status": "ok" })
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(status_ok())
}

// ============================================================
// Saved Filters
// ============================================================

pub async fn list_saved_filters(
    State(db): State<Database>,
) -> Result<Json<Vec<SavedFilter>>, (StatusCode, String)> {
    db.list_saved_filters().map(Json).map_err(store_error)
}

pub async fn create_saved_filter(
    State(db): State<Database>,
    Json(input): Json<CreateSavedFilterInput>,
) -> Result<(StatusCode, Json<SavedFilter>), (StatusCode, String)> {
    if input.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name must not be empty".to_string()));
    }
    if input.conditions.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "conditions must not be empty".to_string(),
        ));
    }

    db.create_saved_filter(input)
        .map(|filter| (StatusCode::CREATED, Json(filter)))
        .map_err(store_error)
}

/// Query parameters addressing one saved filter, e.g.
/// `PUT /api/saved-filters/filter?id=3`.
#[derive(Debug, Deserialize)]
pub struct FilterIdQuery {
    pub id: i64,
}

pub async fn update_saved_filter(
    State(db): State<Database>,
    Query(query): Query<FilterIdQuery>,
    Json(input): Json<UpdateSavedFilterInput>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if input.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name must not be empty".to_string()));
    }

    db.update_saved_filter(query.id, input)
        .map(|_| Json(status_ok()))
        .map_err(store_error)
}

/// Idempotent: deleting an id that is already gone still answers ok.
pub async fn delete_saved_filter(
    State(db): State<Database>,
    Query(query): Query<FilterIdQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    db.delete_saved_filter(query.id)
        .map(|_| Json(status_ok()))
        .map_err(store_error)
}

pub async fn reorder_saved_filters(
    State(db): State<Database>,
    Json(entries): Json<Vec<ReorderEntry>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if entries.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "reorder batch must not be empty".to_string(),
        ));
    }

    db.reorder_saved_filters(&entries)
        .map(|_| Json(status_ok()))
        .map_err(store_error)
}

// ============================================================
// Article Filtering
// ============================================================

#[derive(Debug, Deserialize)]
pub struct FilterArticlesRequest {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Serialize)]
pub struct FilterArticlesResponse {
    pub articles: Vec<Article>,
    pub has_more: bool,
    pub total: usize,
}

pub async fn filter_articles(
    State(db): State<Database>,
    Json(request): Json<FilterArticlesRequest>,
) -> Result<Json<FilterArticlesResponse>, (StatusCode, String)> {
    let page = request.page.max(1) as usize;
    let limit = request.limit.clamp(1, 500) as usize;

    let conditions = filter::valid_conditions(&request.conditions);
    let articles = db.list_articles().map_err(store_error)?;

    // No valid conditions means no filter is active, not an empty result.
    let matches: Vec<Article> = if conditions.is_empty() {
        articles
    } else {
        articles
            .into_iter()
            .filter(|article| filter::evaluate(article, &conditions))
            .collect()
    };

    let total = matches.len();
    let page_articles: Vec<Article> = matches
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();
    let has_more = page * limit < total;

    Ok(Json(FilterArticlesResponse {
        articles: page_articles,
        has_more,
        total,
    }))
}

// ============================================================
// Rules
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ApplyRuleRequest {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Serialize)]
pub struct ApplyRuleResponse {
    pub success: bool,
    pub affected: u64,
}

pub async fn apply_rule(
    State(db): State<Database>,
    Json(request): Json<ApplyRuleRequest>,
) -> Result<Json<ApplyRuleResponse>, (StatusCode, String)> {
    let rule = Rule {
        conditions: request.conditions,
        actions: request.actions,
    };

    let engine = RuleEngine::new(db.clone(), db);
    match engine.apply(&rule, &CancelToken::new()) {
        Ok(outcome) => Ok(Json(ApplyRuleResponse {
            success: true,
            affected: outcome.affected,
        })),
        Err(err @ (RuleError::NoActions | RuleError::NoConditions)) => {
            Err((StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(RuleError::Source(err)) => {
            tracing::error!("Rule application failed: {err:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ))
        }
    }
}
