use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::models::{IssueList, IssueStatus};
use super::store::SharedStore;
use super::validate::{self, Candidate};
use crate::errors::TrackerError;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub store: SharedStore,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid request: {}", msg),
            ),
            ApiError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid request: {}", msg),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal Server Error: {}", msg),
            ),
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        if err.is_client_fault() {
            return ApiError::Unprocessable(err.to_string());
        }
        tracing::error!(error = ?err, "issue store operation failed");
        ApiError::Internal(err.to_string())
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/issues", get(list_issues).post(create_issue))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Server-side defaults: `created` is always overwritten, a falsy `status`
/// becomes `New`.
fn apply_defaults(candidate: &mut Candidate, now: DateTime<Utc>) {
    candidate.insert(
        "created".to_string(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    if validate::is_blank(candidate.get("status")) {
        candidate.insert(
            "status".to_string(),
            Value::String(IssueStatus::default().as_str().to_string()),
        );
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_issues(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let issues = state.store.list().await.map_err(TrackerError::Store)?;
    Ok(Json(IssueList::from(issues)))
}

async fn create_issue(
    State(state): State<SharedState>,
    body: Result<Json<Candidate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mut candidate) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    apply_defaults(&mut candidate, Utc::now());

    let new_issue = validate::into_new_issue(&candidate).map_err(TrackerError::from)?;
    let issue = state.store.insert_and_fetch(new_issue).await?;
    tracing::info!(id = %issue.id, owner = %issue.owner, "issue created");
    Ok(Json(issue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::db::{DbHandle, IssueDb};
    use crate::tracker::models::{Issue, IssueId, NewIssue};
    use crate::tracker::store::{IssueStore, MemoryStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Store whose backend is unreachable.
    struct DownStore;

    #[async_trait]
    impl IssueStore for DownStore {
        async fn list(&self) -> anyhow::Result<Vec<Issue>> {
            anyhow::bail!("connection refused")
        }

        async fn insert(&self, _issue: NewIssue) -> anyhow::Result<IssueId> {
            anyhow::bail!("connection refused")
        }

        async fn find(&self, _id: &IssueId) -> anyhow::Result<Option<Issue>> {
            anyhow::bail!("connection refused")
        }
    }

    fn test_app() -> Router {
        app_with_store(Arc::new(MemoryStore::new()))
    }

    fn app_with_store(store: SharedStore) -> Router {
        api_router().with_state(Arc::new(AppState::new(store)))
    }

    async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_issue(payload: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/issues")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    fn get_issues() -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri("/api/issues")
            .body(Body::empty())
            .unwrap()
    }

    // 1. Health check
    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    // 2. List issues (empty)
    #[tokio::test]
    async fn test_list_issues_empty() {
        let app = test_app();

        let response = app.oneshot(get_issues()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(
            body,
            serde_json::json!({"_metadata": {"total_count": 0}, "records": []})
        );
    }

    // 3. Create issue with defaults
    #[tokio::test]
    async fn test_create_issue_applies_defaults() {
        let app = test_app();
        let before = Utc::now();

        let response = app
            .oneshot(post_issue(serde_json::json!({"owner": "alice", "title": "bug"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let issue: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(issue["status"], "New");
        assert_eq!(issue["owner"], "alice");
        assert_eq!(issue["title"], "bug");
        assert!(!issue["_id"].as_str().unwrap().is_empty());

        let created: DateTime<Utc> = issue["created"].as_str().unwrap().parse().unwrap();
        let drift = (created - before).num_seconds().abs();
        assert!(drift < 5, "created should be close to request time");
    }

    // 4. Missing owner
    #[tokio::test]
    async fn test_create_issue_missing_owner() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_issue(serde_json::json!({"title": "bug"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Invalid request: owner is required.");

        // Nothing persisted
        let response = app.oneshot(get_issues()).await.unwrap();
        let list: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(list["_metadata"]["total_count"], 0);
    }

    // 5. Missing title reported after owner
    #[tokio::test]
    async fn test_create_issue_missing_title() {
        let app = test_app();

        let response = app
            .oneshot(post_issue(serde_json::json!({"owner": "alice", "title": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Invalid request: title is required.");
    }

    // 6. Invalid status
    #[tokio::test]
    async fn test_create_issue_invalid_status() {
        let app = test_app();

        let response = app
            .oneshot(post_issue(
                serde_json::json!({"owner": "a", "title": "b", "status": "Bogus"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Invalid request: Bogus is not a valid status.");
    }

    #[tokio::test]
    async fn test_create_issue_non_string_status() {
        let app = test_app();

        for (status, message) in [
            (serde_json::json!(5), "Invalid request: 5 is not a valid status."),
            (serde_json::json!(true), "Invalid request: true is not a valid status."),
        ] {
            let response = app
                .clone()
                .oneshot(post_issue(
                    serde_json::json!({"owner": "a", "title": "b", "status": status}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

            let body: serde_json::Value = body_json(response.into_body()).await;
            assert_eq!(body["message"], message);
        }

        let list: serde_json::Value =
            body_json(app.oneshot(get_issues()).await.unwrap().into_body()).await;
        assert_eq!(list["_metadata"]["total_count"], 0);
    }

    // 7. Wrongly typed field
    #[tokio::test]
    async fn test_create_issue_wrong_type() {
        let app = test_app();

        let response = app
            .oneshot(post_issue(serde_json::json!({"owner": 7, "title": "b"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Invalid request: owner must be text.");
    }

    // 8. Unrecognized fields stripped, client created/id ignored
    #[tokio::test]
    async fn test_create_issue_strips_unknown_fields() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with_store(store.clone());

        let response = app
            .oneshot(post_issue(serde_json::json!({
                "owner": "a",
                "title": "b",
                "status": "Assigned",
                "secretField": "x",
                "_id": "mine",
                "created": "1999-01-01T00:00:00Z",
                "effort": 0,
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let issue: serde_json::Value = body_json(response.into_body()).await;
        assert!(issue.get("secretField").is_none());
        assert_ne!(issue["_id"], "mine");
        assert_ne!(issue["created"], "1999-01-01T00:00:00Z");
        assert_eq!(issue["status"], "Assigned");
        assert_eq!(issue["effort"], 0);

        let stored = store.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        let stored_json = serde_json::to_value(&stored[0]).unwrap();
        assert!(stored_json.get("secretField").is_none());
    }

    // 9. Duplicate payloads produce distinct records
    #[tokio::test]
    async fn test_create_issue_twice_yields_distinct_ids() {
        let app = test_app();
        let payload = serde_json::json!({"owner": "a", "title": "b"});

        let first: serde_json::Value = body_json(
            app.clone()
                .oneshot(post_issue(payload.clone()))
                .await
                .unwrap()
                .into_body(),
        )
        .await;
        let second: serde_json::Value = body_json(
            app.clone()
                .oneshot(post_issue(payload))
                .await
                .unwrap()
                .into_body(),
        )
        .await;
        assert_ne!(first["_id"], second["_id"]);

        let list: serde_json::Value =
            body_json(app.oneshot(get_issues()).await.unwrap().into_body()).await;
        assert_eq!(list["_metadata"]["total_count"], 2);
    }

    // 10. Round trip through list
    #[tokio::test]
    async fn test_created_issue_appears_verbatim_in_list() {
        let app = test_app();

        let created: serde_json::Value = body_json(
            app.clone()
                .oneshot(post_issue(serde_json::json!({
                    "owner": "carol",
                    "title": "crash on save",
                    "completionDate": "2024-07-01T12:00:00Z",
                })))
                .await
                .unwrap()
                .into_body(),
        )
        .await;

        let list: serde_json::Value =
            body_json(app.oneshot(get_issues()).await.unwrap().into_body()).await;
        let records = list["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], created);
    }

    // 11. Malformed body
    #[tokio::test]
    async fn test_create_issue_rejects_non_object_body() {
        let app = test_app();

        let response = app
            .oneshot(post_issue(serde_json::json!(["owner", "title"])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = body_json(response.into_body()).await;
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request: ")
        );
    }

    // 12. Store faults
    #[tokio::test]
    async fn test_list_issues_store_fault() {
        let app = app_with_store(Arc::new(DownStore));

        let response = app.oneshot(get_issues()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Internal Server Error: connection refused");
    }

    #[tokio::test]
    async fn test_create_issue_store_fault() {
        let app = app_with_store(Arc::new(DownStore));

        let response = app
            .oneshot(post_issue(serde_json::json!({"owner": "a", "title": "b"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Internal Server Error: connection refused");
    }

    #[tokio::test]
    async fn test_sqlite_fault_reports_underlying_cause() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.db");
        let db = IssueDb::new(&path).unwrap();
        let app = app_with_store(Arc::new(DbHandle::new(db)));

        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE issues")
            .unwrap();

        let response = app.clone().oneshot(get_issues()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = body_json(response.into_body()).await;
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("Internal Server Error: "));
        assert!(message.contains("no such table: issues"), "got {message}");

        let response = app
            .oneshot(post_issue(serde_json::json!({"owner": "a", "title": "b"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("no such table: issues")
        );
    }

    #[tokio::test]
    async fn test_validation_runs_before_store_access() {
        let app = app_with_store(Arc::new(DownStore));

        let response = app
            .oneshot(post_issue(serde_json::json!({"title": "b"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_apply_defaults_overwrites_created_and_keeps_status() {
        let now = Utc::now();
        let mut candidate = Candidate::new();
        candidate.insert("created".into(), serde_json::json!("1999-01-01T00:00:00Z"));
        candidate.insert("status".into(), serde_json::json!("Closed"));

        apply_defaults(&mut candidate, now);
        assert_eq!(candidate["status"], "Closed");
        assert_eq!(
            candidate["created"],
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        );

        candidate.insert("status".into(), serde_json::json!(""));
        apply_defaults(&mut candidate, now);
        assert_eq!(candidate["status"], "New");
    }
}
