// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Contact-form intake: validate a submission, then persist it as one
//! document in the `inquiry` collection.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Deserializer, Serialize};
use snafu::{OptionExt, ResultExt, Snafu};
use thaispa_store::DocumentStore;
use validator::Validate;

use crate::{
    error::{ApiResult, PersistenceSnafu},
    extract::{Schema, ValidatedJson},
    state::AppState,
};

/// Collection label every inquiry document is stored under.
pub const INQUIRY_COLLECTION: &str = "inquiry";

/// A contact-form submission from a prospective customer.
///
/// String fields are trimmed while decoding, and optional fields that are
/// blank after trimming decode as `None`. Keys outside the schema are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Inquiry {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub name:    String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email)]
    pub email:   String,
    #[serde(
        default,
        deserialize_with = "trimmed_non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(max = 32))]
    pub phone:   Option<String>,
    /// Service the customer asks about, usually a catalog slug
    #[serde(
        default,
        deserialize_with = "trimmed_non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(max = 64))]
    pub service: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

impl Schema for Inquiry {
    const ENTITY: &'static str = "inquiry";
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

fn trimmed_non_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|value| {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum IntakeError {
    #[snafu(display("Database not available"))]
    StoreUnavailable,

    #[snafu(display("Failed to encode inquiry"))]
    Encode { source: serde_json::Error },

    #[snafu(display("Database write failed"))]
    Write { source: thaispa_store::Error },
}

/// Persists an already validated inquiry and returns its storage id.
///
/// Performs at most one write and never retries.
#[tracing::instrument(level = "debug", skip_all, err)]
pub async fn submit_inquiry(
    store: Option<&dyn DocumentStore>,
    inquiry: &Inquiry,
) -> Result<String, IntakeError> {
    let store = store.context(StoreUnavailableSnafu)?;
    let data = serde_json::to_value(inquiry).context(EncodeSnafu)?;
    let id = store
        .create_document(INQUIRY_COLLECTION, &data)
        .await
        .context(WriteSnafu)?;
    tracing::info!(%id, service = ?inquiry.service, "inquiry stored");
    Ok(id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryAccepted {
    pub status: String,
    pub id:     String,
}

async fn create_inquiry(
    State(state): State<AppState>,
    ValidatedJson(inquiry): ValidatedJson<Inquiry>,
) -> ApiResult<Json<InquiryAccepted>> {
    let id = submit_inquiry(state.store(), &inquiry)
        .await
        .context(PersistenceSnafu {
            entity: Inquiry::ENTITY,
        })?;
    Ok(Json(InquiryAccepted {
        status: "ok".to_string(),
        id,
    }))
}

pub fn inquiry_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/api/inquiry", post(create_inquiry))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use thaispa_store::{DatabaseConfig, Document, SqliteDocumentStore};
    use tower::ServiceExt;

    use super::*;
    use crate::http::{RestServerConfig, api_router};

    /// Records every write and hands out sequential ids.
    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        fn name(&self) -> &str { "recording" }

        async fn create_document(
            &self,
            collection: &str,
            data: &Value,
        ) -> thaispa_store::Result<String> {
            let mut writes = self.writes.lock().unwrap();
            writes.push((collection.to_string(), data.clone()));
            Ok(format!("doc-{}", writes.len()))
        }

        async fn get_document(
            &self,
            _collection: &str,
            _id: &str,
        ) -> thaispa_store::Result<Option<Document>> {
            Ok(None)
        }

        async fn list_collection_names(&self) -> thaispa_store::Result<Vec<String>> {
            Ok(vec![])
        }
    }

    /// Fails every write as if the pool had timed out.
    struct TimingOutStore;

    #[async_trait]
    impl DocumentStore for TimingOutStore {
        fn name(&self) -> &str { "timing-out" }

        async fn create_document(
            &self,
            _collection: &str,
            _data: &Value,
        ) -> thaispa_store::Result<String> {
            Err(sqlx::Error::PoolTimedOut.into())
        }

        async fn get_document(
            &self,
            _collection: &str,
            _id: &str,
        ) -> thaispa_store::Result<Option<Document>> {
            Err(sqlx::Error::PoolTimedOut.into())
        }

        async fn list_collection_names(&self) -> thaispa_store::Result<Vec<String>> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
    }

    fn router_with(store: Option<Arc<dyn DocumentStore>>) -> Router {
        let state = AppState::builder().maybe_store(store).build();
        api_router(&RestServerConfig::default(), state, &[inquiry_routes])
    }

    async fn post_json(router: Router, body: &str) -> (StatusCode, Value) {
        let request = Request::post("/api/inquiry")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    const ANNA: &str = r#"{"name": "Anna", "email": "a@example.com", "message": "Booking question"}"#;

    #[tokio::test]
    async fn test_valid_inquiry_is_stored_once() {
        let store = Arc::new(RecordingStore::default());
        let (status, body) = post_json(router_with(Some(store.clone())), ANNA).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "id": "doc-1"}));

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, INQUIRY_COLLECTION);
        assert_eq!(
            writes[0].1,
            json!({"name": "Anna", "email": "a@example.com", "message": "Booking question"})
        );
    }

    #[tokio::test]
    async fn test_empty_payload_is_rejected_without_writes() {
        let store = Arc::new(RecordingStore::default());
        let (status, body) = post_json(router_with(Some(store.clone())), "{}").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_argument");
        assert!(body["detail"].as_str().unwrap().contains("name"));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_constraint_violations_report_fields() {
        let store = Arc::new(RecordingStore::default());
        let payload = r#"{"name": "   ", "email": "not-an-email", "message": "hi"}"#;
        let (status, body) = post_json(router_with(Some(store.clone())), payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["fields"],
            json!([
                {"field": "email", "code": "email"},
                {"field": "name", "code": "length"},
            ])
        );
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extra_fields_are_ignored_and_never_stored() {
        let store = Arc::new(RecordingStore::default());
        let payload = r#"{"name": "Anna", "email": "a@example.com", "message": "x",
                          "preferred_date": "2025-05-01", "admin": true}"#;
        let (status, body) = post_json(router_with(Some(store.clone())), payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0].1,
            json!({"name": "Anna", "email": "a@example.com", "message": "x"})
        );
        assert!(writes[0].1.get("preferred_date").is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let store = Arc::new(RecordingStore::default());
        let (status, body) = post_json(router_with(Some(store.clone())), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_argument");

        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_optional_fields_are_trimmed() {
        let store = Arc::new(RecordingStore::default());
        let payload = r#"{"name": " Anna ", "email": "a@example.com", "phone": "  ",
                          "service": " aroma-oil ", "message": " Booking question "}"#;
        let (status, _) = post_json(router_with(Some(store.clone())), payload).await;
        assert_eq!(status, StatusCode::OK);

        let writes = store.writes.lock().unwrap();
        assert_eq!(
            writes[0].1,
            json!({
                "name": "Anna",
                "email": "a@example.com",
                "service": "aroma-oil",
                "message": "Booking question",
            })
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_a_server_error() {
        let (status, body) = post_json(router_with(Some(Arc::new(TimingOutStore))), ANNA).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "internal");
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Failed to persist inquiry"));
        assert!(detail.chars().count() <= thaispa_error::MAX_OUTPUT_MSG_LEN);
    }

    #[tokio::test]
    async fn test_missing_store_is_a_server_error() {
        let (status, body) = post_json(router_with(None), ANNA).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["detail"],
            "Failed to persist inquiry: Database not available"
        );
    }

    #[tokio::test]
    async fn test_submitted_inquiry_is_retrievable() {
        let config = DatabaseConfig::builder().url("sqlite::memory:").build();
        let store = SqliteDocumentStore::connect(&config).await.unwrap();
        let inquiry = Inquiry {
            name:    "Anna".to_string(),
            email:   "a@example.com".to_string(),
            phone:   Some("+36 1 234 5678".to_string()),
            service: Some("traditional-thai".to_string()),
            message: "Booking question".to_string(),
        };

        let id = submit_inquiry(Some(&store), &inquiry).await.unwrap();
        let doc = store
            .get_document(INQUIRY_COLLECTION, &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.body["phone"], "+36 1 234 5678");
        assert_eq!(doc.body["service"], "traditional-thai");
        assert!(doc.body["created_at"].is_string());
    }
}
