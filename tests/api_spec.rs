use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use newshound::api::{create_router, create_router_with_auth, middleware::AuthConfig};
use newshound::db::Database;
use newshound::models::*;
use serde_json::json;

fn setup() -> (TestServer, Database) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let server = TestServer::new(create_router(db.clone())).expect("Failed to create test server");
    (server, db)
}

fn title_conditions(value: &str) -> String {
    json!({
        "version": 1,
        "conditions": [
            {"field": "title", "operator": "contains", "value": value}
        ]
    })
    .to_string()
}

async fn create_filter(server: &TestServer, name: &str) -> SavedFilter {
    server
        .post("/api/saved-filters")
        .json(&json!({ "name": name, "conditions": title_conditions("go") }))
        .await
        .json::<SavedFilter>()
}

fn seed_article(db: &Database, id: &str, title: &str, published: &str, read: bool, categories: &[&str]) {
    db.upsert_article(&Article {
        id: id.to_string(),
        feed_id: "feed-1".to_string(),
        title: title.to_string(),
        link: format!("https://example.com/{id}"),
        author: "Example".to_string(),
        content: String::new(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        published_at: published.parse::<DateTime<Utc>>().expect("valid timestamp"),
        read,
        starred: false,
    })
    .expect("Failed to seed article");
}

mod saved_filters {
    use super::*;

    #[tokio::test]
    async fn list_returns_empty_array_when_nothing_saved() {
        let (server, _db) = setup();

        let response = server.get("/api/saved-filters").await;

        response.assert_status_ok();
        let filters: Vec<SavedFilter> = response.json();
        assert!(filters.is_empty());
    }

    #[tokio::test]
    async fn create_returns_201_with_the_stored_filter() {
        let (server, _db) = setup();

        let response = server
            .post("/api/saved-filters")
            .json(&json!({ "name": "tech", "conditions": title_conditions("go") }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let filter: SavedFilter = response.json();
        assert_eq!(filter.name, "tech");
        assert_eq!(filter.position, 1);
        assert!(filter.conditions.contains("\"version\""));
    }

    #[tokio::test]
    async fn create_without_name_is_a_validation_error() {
        let (server, _db) = setup();

        let response = server
            .post("/api/saved-filters")
            .json(&json!({ "conditions": title_conditions("go") }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_without_conditions_is_a_validation_error() {
        let (server, _db) = setup();

        let response = server
            .post("/api/saved-filters")
            .json(&json!({ "name": "tech" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_undecodable_conditions_is_rejected() {
        let (server, _db) = setup();

        let response = server
            .post("/api/saved-filters")
            .json(&json!({ "name": "tech", "conditions": "{broken" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts_and_does_not_add_a_row() {
        let (server, _db) = setup();
        create_filter(&server, "tech").await;

        let response = server
            .post("/api/saved-filters")
            .json(&json!({ "name": "tech", "conditions": title_conditions("rust") }))
            .await;

        response.assert_status(StatusCode::CONFLICT);

        let filters: Vec<SavedFilter> = server.get("/api/saved-filters").await.json();
        assert_eq!(filters.len(), 1);
    }

    #[tokio::test]
    async fn update_changes_name_and_conditions() {
        let (server, _db) = setup();
        let filter = create_filter(&server, "tech").await;

        let response = server
            .put(&format!("/api/saved-filters/filter?id={}", filter.id))
            .json(&json!({ "name": "rust news", "conditions": title_conditions("rust") }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["status"], "ok");

        let filters: Vec<SavedFilter> = server.get("/api/saved-filters").await.json();
        assert_eq!(filters[0].name, "rust news");
        assert!(filters[0].conditions.contains("rust"));
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let (server, _db) = setup();

        let response = server
            .put("/api/saved-filters/filter?id=999")
            .json(&json!({ "name": "ghost", "conditions": title_conditions("go") }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_renaming_onto_existing_name_conflicts() {
        let (server, _db) = setup();
        create_filter(&server, "tech").await;
        let other = create_filter(&server, "releases").await;

        let response = server
            .put(&format!("/api/saved-filters/filter?id={}", other.id))
            .json(&json!({ "name": "tech", "conditions": title_conditions("go") }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn delete_is_idempotent_at_the_api_layer() {
        let (server, _db) = setup();
        let filter = create_filter(&server, "tech").await;

        let url = format!("/api/saved-filters/filter?id={}", filter.id);
        server.delete(&url).await.assert_status_ok();
        server.delete(&url).await.assert_status_ok();

        let filters: Vec<SavedFilter> = server.get("/api/saved-filters").await.json();
        assert!(filters.is_empty());
    }

    #[tokio::test]
    async fn reorder_applies_the_new_display_order() {
        let (server, _db) = setup();
        let a = create_filter(&server, "a").await;
        let b = create_filter(&server, "b").await;
        let c = create_filter(&server, "c").await;

        let response = server
            .post("/api/saved-filters/reorder")
            .json(&json!([
                {"id": c.id, "position": 1},
                {"id": a.id, "position": 2},
                {"id": b.id, "position": 3}
            ]))
            .await;

        response.assert_status_ok();

        let names: Vec<String> = server
            .get("/api/saved-filters")
            .await
            .json::<Vec<SavedFilter>>()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn reorder_entries_tolerate_extra_fields() {
        let (server, _db) = setup();
        let a = create_filter(&server, "a").await;
        let b = create_filter(&server, "b").await;

        let response = server
            .post("/api/saved-filters/reorder")
            .json(&json!([
                {"id": b.id, "position": 1, "name": "b", "conditions": "[]"},
                {"id": a.id, "position": 2, "name": "a", "conditions": "[]"}
            ]))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn reorder_with_unknown_id_rolls_back_the_batch() {
        let (server, _db) = setup();
        let a = create_filter(&server, "a").await;
        let b = create_filter(&server, "b").await;

        let response = server
            .post("/api/saved-filters/reorder")
            .json(&json!([
                {"id": b.id, "position": 1},
                {"id": 999, "position": 2},
                {"id": a.id, "position": 3}
            ]))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);

        let names: Vec<String> = server
            .get("/api/saved-filters")
            .await
            .json::<Vec<SavedFilter>>()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn reorder_rejects_an_empty_batch() {
        let (server, _db) = setup();

        let response = server.post("/api/saved-filters/reorder").json(&json!([])).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod articles_filter {
    use super::*;

    #[tokio::test]
    async fn no_conditions_means_no_filter_active() {
        let (server, db) = setup();
        seed_article(&db, "a", "Go 1.22 released", "2024-03-01T00:00:00Z", false, &["go"]);
        seed_article(&db, "b", "Rust 1.79 released", "2024-03-02T00:00:00Z", false, &["rust"]);

        let response = server
            .post("/api/articles/filter")
            .json(&json!({ "conditions": [] }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 2);
        assert_eq!(body["articles"].as_array().unwrap().len(), 2);
        assert_eq!(body["has_more"], false);
    }

    #[tokio::test]
    async fn chained_conditions_select_matching_articles() {
        let (server, db) = setup();
        seed_article(&db, "a", "Go 1.22 released", "2024-03-01T00:00:00Z", false, &["go", "release"]);
        seed_article(&db, "b", "Go retrospective", "2024-03-02T00:00:00Z", true, &["go"]);
        seed_article(&db, "c", "Rust 1.79 released", "2024-03-03T00:00:00Z", false, &["rust"]);

        // title contains "go" AND read equals "false"
        let response = server
            .post("/api/articles/filter")
            .json(&json!({
                "conditions": [
                    {"field": "title", "operator": "contains", "value": "go", "logic": "none", "negate": false},
                    {"field": "read", "operator": "equals", "value": "false", "logic": "and", "negate": false}
                ]
            }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 1);
        assert_eq!(body["articles"][0]["id"], "a");
    }

    #[tokio::test]
    async fn negating_a_condition_flips_the_selection() {
        let (server, db) = setup();
        seed_article(&db, "a", "Go 1.22 released", "2024-03-01T00:00:00Z", false, &["go", "release"]);

        let response = server
            .post("/api/articles/filter")
            .json(&json!({
                "conditions": [
                    {"field": "title", "operator": "contains", "value": "go", "logic": "none"},
                    {"field": "read", "operator": "equals", "value": "false", "logic": "and", "negate": true}
                ]
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["total"], 0);
    }

    #[tokio::test]
    async fn invalid_conditions_are_excluded_not_fatal() {
        let (server, db) = setup();
        seed_article(&db, "a", "Go 1.22 released", "2024-03-01T00:00:00Z", false, &[]);
        seed_article(&db, "b", "Rust 1.79", "2024-03-02T00:00:00Z", false, &[]);

        // The empty-value condition is dropped; the valid one still filters.
        let response = server
            .post("/api/articles/filter")
            .json(&json!({
                "conditions": [
                    {"field": "author", "operator": "contains", "value": "", "logic": "none"},
                    {"field": "title", "operator": "contains", "value": "go", "logic": "and"}
                ]
            }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 1);
        assert_eq!(body["articles"][0]["id"], "a");
    }

    #[tokio::test]
    async fn sequential_pages_neither_skip_nor_duplicate() {
        let (server, db) = setup();
        for i in 1..=5 {
            seed_article(
                &db,
                &format!("a{i}"),
                &format!("Article {i}"),
                &format!("2024-03-0{i}T00:00:00Z"),
                false,
                &[],
            );
        }

        let mut seen = Vec::new();
        for page in 1..=3 {
            let response = server
                .post("/api/articles/filter")
                .json(&json!({ "conditions": [], "page": page, "limit": 2 }))
                .await;

            response.assert_status_ok();
            let body: serde_json::Value = response.json();
            assert_eq!(body["total"], 5);
            assert_eq!(body["has_more"], page < 3);

            for article in body["articles"].as_array().unwrap() {
                seen.push(article["id"].as_str().unwrap().to_string());
            }
        }

        // Newest first, every article exactly once.
        assert_eq!(seen, vec!["a5", "a4", "a3", "a2", "a1"]);
    }
}

mod rules_apply {
    use super::*;

    #[tokio::test]
    async fn marks_matching_articles_read() {
        let (server, db) = setup();
        seed_article(&db, "a", "Go 1.22 released", "2024-03-01T00:00:00Z", false, &[]);
        seed_article(&db, "b", "Go weekly", "2024-03-02T00:00:00Z", false, &[]);
        seed_article(&db, "c", "Rust 1.79", "2024-03-03T00:00:00Z", false, &[]);

        let response = server
            .post("/api/rules/apply")
            .json(&json!({
                "conditions": [
                    {"field": "title", "operator": "contains", "value": "go", "logic": "none"}
                ],
                "actions": [{"kind": "mark_read"}]
            }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["affected"], 2);

        assert!(db.get_article("a").unwrap().unwrap().read);
        assert!(db.get_article("b").unwrap().unwrap().read);
        assert!(!db.get_article("c").unwrap().unwrap().read);
    }

    #[tokio::test]
    async fn delete_action_removes_matches() {
        let (server, db) = setup();
        seed_article(&db, "a", "Sponsored: buy now", "2024-03-01T00:00:00Z", false, &[]);
        seed_article(&db, "b", "Go 1.22 released", "2024-03-02T00:00:00Z", false, &[]);

        let response = server
            .post("/api/rules/apply")
            .json(&json!({
                "conditions": [
                    {"field": "title", "operator": "starts_with", "value": "sponsored", "logic": "none"}
                ],
                "actions": [{"kind": "delete"}]
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["affected"], 1);
        assert!(db.get_article("a").unwrap().is_none());
        assert!(db.get_article("b").unwrap().is_some());
    }

    #[tokio::test]
    async fn zero_matches_is_success_with_zero_affected() {
        let (server, db) = setup();
        seed_article(&db, "a", "Rust 1.79", "2024-03-01T00:00:00Z", false, &[]);

        let response = server
            .post("/api/rules/apply")
            .json(&json!({
                "conditions": [
                    {"field": "title", "operator": "contains", "value": "zig", "logic": "none"}
                ],
                "actions": [{"kind": "mark_read"}]
            }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["affected"], 0);
    }

    #[tokio::test]
    async fn empty_actions_are_rejected() {
        let (server, _db) = setup();

        let response = server
            .post("/api/rules/apply")
            .json(&json!({
                "conditions": [
                    {"field": "title", "operator": "contains", "value": "go", "logic": "none"}
                ],
                "actions": []
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rules_without_usable_conditions_are_rejected() {
        let (server, db) = setup();
        seed_article(&db, "a", "Go 1.22 released", "2024-03-01T00:00:00Z", false, &[]);

        let response = server
            .post("/api/rules/apply")
            .json(&json!({ "conditions": [], "actions": [{"kind": "mark_read"}] }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!db.get_article("a").unwrap().unwrap().read);
    }
}

mod auth {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn setup_with_key(key: &str) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let app = create_router_with_auth(db, AuthConfig::with_api_key(key));
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn requests_without_a_token_are_unauthorized() {
        let server = setup_with_key("secret");

        let response = server.get("/api/saved-filters").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn requests_with_the_wrong_token_are_unauthorized() {
        let server = setup_with_key("secret");

        let response = server
            .get("/api/saved-filters")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("Bearer wrong"),
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn requests_with_the_configured_token_pass() {
        let server = setup_with_key("secret");

        let response = server
            .get("/api/saved-filters")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("Bearer secret"),
            )
            .await;
        response.assert_status_ok();
    }
}
