//! Record CRUD handlers: list, create, simple-create, get, update, delete.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;

use crate::api::dto::{CreateRecordRequest, UpdateRecordRequest};
use crate::api::extract::{AuthorizedCaller, JsonBody, LoadedRecord, NewRecordValue};
use crate::app_state::AppState;
use crate::error::ApiError;

/// Serializes `body` as a JSON response with the given status.
///
/// # Errors
///
/// Returns [`ApiError::Render`] if `body` cannot be serialized.
fn render<T: Serialize>(status: StatusCode, body: &T) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Render(e.to_string()))?;
    let mut response = (status, bytes).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

/// `GET /records` — List every record.
///
/// # Errors
///
/// Returns [`ApiError::Render`] if the records cannot be read or encoded.
pub async fn list_records(State(state): State<AppState>) -> Result<Response, ApiError> {
    let records = state
        .record_service
        .list()
        .await
        .map_err(|e| ApiError::Render(e.to_string()))?;

    render(StatusCode::OK, &records)
}

/// `POST /records` — Create a record from a JSON body.
///
/// Any `id` in the body is discarded; the server assigns a fresh one.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] if the body is malformed or lacks
/// a value, or [`ApiError::Store`] if persisting fails.
pub async fn create_record(
    _caller: AuthorizedCaller,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateRecordRequest>,
) -> Result<Response, ApiError> {
    let (value, created_at) = req.validate()?;
    let record = state.record_service.create(value, created_at).await?;

    render(StatusCode::CREATED, &record)
}

/// `GET /records/simple-add/{value}` — Create a record from a bare value.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] if the value does not parse, or
/// [`ApiError::Store`] if persisting fails.
pub async fn simple_create_record(
    _caller: AuthorizedCaller,
    State(state): State<AppState>,
    NewRecordValue(value): NewRecordValue,
) -> Result<Response, ApiError> {
    let record = state.record_service.create_by_value(value).await?;

    render(StatusCode::CREATED, &record)
}

/// `GET /records/{id}` — Get a single record.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] (via the loader) if the record does not
/// exist.
pub async fn get_record(LoadedRecord(record): LoadedRecord) -> Result<Response, ApiError> {
    render(StatusCode::OK, &record)
}

/// `PUT /records/{id}` — Update a record.
///
/// Body fields overlay the stored record; the id always comes from the
/// path.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the record does not exist,
/// [`ApiError::InvalidRequest`] on a malformed body, or
/// [`ApiError::Store`] if persisting fails.
pub async fn update_record(
    _caller: AuthorizedCaller,
    State(state): State<AppState>,
    LoadedRecord(current): LoadedRecord,
    JsonBody(req): JsonBody<UpdateRecordRequest>,
) -> Result<Response, ApiError> {
    let merged = req.apply_to(current)?;
    let record = state.record_service.replace(merged).await?;

    render(StatusCode::OK, &record)
}

/// `DELETE /records/{id}` — Delete a record, echoing it back.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the record does not exist, or
/// [`ApiError::Store`] if the delete fails.
pub async fn delete_record(
    _caller: AuthorizedCaller,
    State(state): State<AppState>,
    LoadedRecord(record): LoadedRecord,
) -> Result<Response, ApiError> {
    let record = state.record_service.delete(record).await?;

    render(StatusCode::OK, &record)
}

/// Record resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records).post(create_record))
        .route("/records/simple-add/{value}", get(simple_create_record))
        .route(
            "/records/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::api::build_app;
    use crate::api::testing::{client, serve, spawn_app, spawn_app_with};
    use crate::app_state::AppState;
    use crate::domain::{Record, RecordId};
    use crate::repository::{
        MemoryRecordRepository, RecordRepository, StoreError, fixture_records,
    };
    use crate::service::RecordService;

    /// Backend whose every operation fails, except reading record `"ok"`.
    #[derive(Debug)]
    struct BrokenRepository;

    fn malformed() -> StoreError {
        let Err(e) = serde_json::from_str::<Value>("{") else {
            panic!("truncated JSON should not parse");
        };
        StoreError::Document(e)
    }

    #[async_trait]
    impl RecordRepository for BrokenRepository {
        async fn get(&self, id: &RecordId) -> Result<Record, StoreError> {
            if id.as_str() == "ok" {
                Ok(Record::new(id.clone(), Utc::now(), 500.0))
            } else {
                Err(malformed())
            }
        }

        async fn get_all(&self) -> Result<Vec<Record>, StoreError> {
            Err(malformed())
        }

        async fn update(
            &self,
            _id: &RecordId,
            _created_at: DateTime<Utc>,
            _value: f32,
        ) -> Result<RecordId, StoreError> {
            Err(malformed())
        }

        async fn remove(&self, _id: &RecordId) -> Result<u64, StoreError> {
            Err(malformed())
        }
    }

    async fn serve_broken() -> SocketAddr {
        let state = AppState::new(RecordService::new(Arc::new(BrokenRepository)), None);
        serve(build_app(state)).await
    }

    async fn status_and_text(req: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let Ok(resp) = req.send().await else {
            panic!("request failed");
        };
        let status = resp.status();
        (status, json_body(resp).await["status"].clone())
    }

    async fn json_body(resp: reqwest::Response) -> Value {
        let Ok(body) = resp.json::<Value>().await else {
            panic!("response body is not JSON");
        };
        body
    }

    #[tokio::test]
    async fn list_returns_every_stored_record() {
        let app = spawn_app().await;

        let resp = app.get("/records").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let Ok(records) = resp.json::<Vec<Record>>().await else {
            panic!("list body is not a record array");
        };
        let Ok(stored) = app.repository.get_all().await else {
            panic!("get_all failed");
        };
        assert_eq!(records, stored);
    }

    #[tokio::test]
    async fn list_of_empty_store_is_empty_array() {
        let app = spawn_app_with(Arc::new(MemoryRecordRepository::new()), None).await;

        let resp = app.get("/records").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!([]));
    }

    #[tokio::test]
    async fn get_returns_fixture_record() {
        let app = spawn_app().await;

        let resp = app.get("/records/1").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let Ok(record) = resp.json::<Record>().await else {
            panic!("body is not a record");
        };
        assert_eq!(record.id.as_str(), "1");
        assert!((record.value - 505.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn get_unknown_record_is_not_found() {
        let app = spawn_app().await;

        let resp = app.get("/records/does-not-exist").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = json_body(resp).await;
        assert_eq!(body["status"], "Resource not found");
    }

    #[tokio::test]
    async fn create_assigns_fresh_id_and_ignores_client_id() {
        let app = spawn_app().await;

        let resp = app
            .post_json("/records", &json!({ "id": "client-id", "value": 505 }))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = json_body(resp).await;
        let Some(id) = body["id"].as_str() else {
            panic!("id missing from {body}");
        };
        assert!(!id.is_empty());
        assert_ne!(id, "client-id");
        assert_eq!(body["value"], 505.0);
        assert!(body["created_at"].as_str().is_some());

        assert_eq!(app.repository.len().await, 7);
    }

    #[tokio::test]
    async fn create_keeps_supplied_timestamp() {
        let app = spawn_app().await;

        let resp = app
            .post_json(
                "/records",
                &json!({ "created_at": "2024-03-01T08:15:00Z", "value": 470.5 }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let Ok(record) = resp.json::<Record>().await else {
            panic!("body is not a record");
        };
        let expected: Option<DateTime<Utc>> = "2024-03-01T08:15:00Z".parse().ok();
        assert_eq!(Some(record.created_at), expected);
    }

    #[tokio::test]
    async fn create_without_value_is_invalid() {
        let app = spawn_app().await;

        let resp = app.post_json("/records", &json!({})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = json_body(resp).await;
        assert_eq!(body["status"], "Invalid request");
        assert_eq!(body["error"], "missing required record fields");
        assert_eq!(app.repository.len().await, 6);
    }

    #[tokio::test]
    async fn create_with_malformed_json_is_invalid() {
        let app = spawn_app().await;

        let resp = app
            .client
            .post(app.url("/records"))
            .body("{not json")
            .send()
            .await;
        let Ok(resp) = resp else {
            panic!("request failed");
        };
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn simple_add_creates_record_from_path() {
        let app = spawn_app().await;

        let resp = app.get("/records/simple-add/480.5").await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let Ok(record) = resp.json::<Record>().await else {
            panic!("body is not a record");
        };
        assert!((record.value - 480.5).abs() < f32::EPSILON);

        let Ok(stored) = app.repository.get(&record.id).await else {
            panic!("record not persisted");
        };
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn simple_add_with_unparsable_value_is_invalid() {
        let app = spawn_app().await;

        let resp = app.get("/records/simple-add/abc").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.repository.len().await, 6);
    }

    #[tokio::test]
    async fn update_replaces_value_and_keeps_id() {
        let app = spawn_app().await;

        let resp = app
            .put_json("/records/3", &json!({ "id": "other", "value": 999 }))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["id"], "3");
        assert_eq!(body["value"], 999.0);

        let Ok(record) = app.get("/records/3").await.json::<Record>().await else {
            panic!("body is not a record");
        };
        assert!((record.value - 999.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn update_unknown_record_is_not_found() {
        let app = spawn_app().await;

        let resp = app.put_json("/records/42", &json!({ "value": 1 })).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.repository.len().await, 6);
    }

    #[tokio::test]
    async fn delete_echoes_record_and_removes_it() {
        let app = spawn_app().await;
        let Ok(before) = app.repository.get(&"2".into()).await else {
            panic!("fixture missing");
        };

        let resp = app.delete("/records/2").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let Ok(deleted) = resp.json::<Record>().await else {
            panic!("body is not a record");
        };
        assert_eq!(deleted, before);

        let resp = app.get("/records/2").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn concurrent_creates_are_all_stored() {
        let app = Arc::new(spawn_app().await);
        let mut handles = Vec::new();
        for i in 0..40u16 {
            let app = Arc::clone(&app);
            handles.push(tokio::spawn(async move {
                app.post_json("/records", &json!({ "value": 400 + i }))
                    .await
                    .status()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.ok() == Some(StatusCode::CREATED) {
                created += 1;
            }
        }
        assert_eq!(created, 40);

        let Ok(records) = app.get("/records").await.json::<Vec<Record>>().await else {
            panic!("list body is not a record array");
        };
        assert_eq!(records.len(), fixture_records(Utc::now()).len() + created);
    }

    #[tokio::test]
    async fn mutations_from_unauthorized_caller_are_forbidden() {
        let app = spawn_app_with(
            Arc::new(MemoryRecordRepository::with_fixtures()),
            Some("203.0.113.9".to_string()),
        )
        .await;

        let resp = app.post_json("/records", &json!({ "value": 505 })).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(resp).await["status"], "Forbidden");

        assert_eq!(
            app.get("/records/simple-add/500").await.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(app.delete("/records/1").await.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.repository.len().await, 6);

        // Reads stay open.
        assert_eq!(app.get("/records/1").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn mutations_from_authorized_caller_pass() {
        let app = spawn_app_with(
            Arc::new(MemoryRecordRepository::with_fixtures()),
            Some("127.0.0.1".to_string()),
        )
        .await;

        let resp = app.post_json("/records", &json!({ "value": 505 })).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn store_failure_on_list_is_render_error() {
        let addr = serve_broken().await;
        let (status, text) = status_and_text(client().get(format!("http://{addr}/records"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(text, "Error rendering response");
    }

    #[tokio::test]
    async fn store_failure_on_create_is_invalid_request() {
        let addr = serve_broken().await;
        let client = client();

        let (status, text) = status_and_text(
            client
                .post(format!("http://{addr}/records"))
                .json(&json!({ "value": 505 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Invalid request");

        let (status, text) =
            status_and_text(client.get(format!("http://{addr}/records/simple-add/500"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Invalid request");
    }

    #[tokio::test]
    async fn store_failure_while_loading_record_is_not_found() {
        let addr = serve_broken().await;
        let client = client();

        let (status, text) =
            status_and_text(client.get(format!("http://{addr}/records/broken"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(text, "Resource not found");

        let (status, _) = status_and_text(
            client
                .put(format!("http://{addr}/records/broken"))
                .json(&json!({ "value": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_on_update_and_delete_is_invalid_request() {
        let addr = serve_broken().await;
        let client = client();

        let (status, text) = status_and_text(
            client
                .put(format!("http://{addr}/records/ok"))
                .json(&json!({ "value": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Invalid request");

        let (status, text) =
            status_and_text(client.delete(format!("http://{addr}/records/ok"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Invalid request");

        // The loader itself still works for readable records.
        let (status, _) = status_and_text(client.get(format!("http://{addr}/records/ok"))).await;
        assert_eq!(status, StatusCode::OK);
    }
}
