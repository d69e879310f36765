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

//! Best-effort health reporting for the storage collaborator.
//!
//! [`probe`] never fails: store errors, timeouts and even panics inside the
//! store are folded into the returned [`DiagnosticReport`].

use std::{any::Any, panic::AssertUnwindSafe, time::Duration};

use axum::{Json, Router, extract::State, routing::get};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thaispa_error::truncate_message;
use thaispa_store::DocumentStore;

use crate::state::AppState;

/// At most this many collection names are reported.
pub const MAX_REPORTED_COLLECTIONS: usize = 10;
/// Probe failure messages are cut to this many characters.
pub const MAX_PROBE_ERROR_LEN: usize = 80;

pub const ROOT_MESSAGE: &str = "Thai Massage Budapest Backend Running";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub backend:           String,
    pub database:          String,
    pub database_url:      Option<String>,
    pub database_name:     Option<String>,
    pub connection_status: String,
    pub collections:       Vec<String>,
}

impl Default for DiagnosticReport {
    fn default() -> Self {
        Self {
            backend:           "✅ Running".to_string(),
            database:          "⚠️ Available but not initialized".to_string(),
            database_url:      None,
            database_name:     None,
            connection_status: "Not Connected".to_string(),
            collections:       Vec::new(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "store panicked".to_string())
}

/// Inspects `store` and reports what it finds.
pub async fn probe(
    store: Option<&dyn DocumentStore>,
    database_url_set: bool,
    timeout: Duration,
) -> DiagnosticReport {
    let mut report = DiagnosticReport::default();

    let Some(store) = store else {
        return report;
    };

    report.database = "✅ Available".to_string();
    report.database_url = Some(if database_url_set { "✅ Set" } else { "❌ Not Set" }.to_string());
    report.database_name = Some(store.name().to_string());
    report.connection_status = "Connected".to_string();

    let listing = AssertUnwindSafe(tokio::time::timeout(timeout, store.list_collection_names()))
        .catch_unwind()
        .await;

    let failure = match listing {
        Ok(Ok(Ok(mut collections))) => {
            collections.truncate(MAX_REPORTED_COLLECTIONS);
            report.collections = collections;
            report.database = "✅ Connected & Working".to_string();
            return report;
        }
        Ok(Ok(Err(err))) => err.to_string(),
        Ok(Err(_elapsed)) => format!("listing collections timed out after {timeout:?}"),
        Err(payload) => panic_message(payload.as_ref()),
    };

    tracing::warn!(error = %failure, "database probe failed");
    report.database = format!(
        "⚠️ Connected but Error: {}",
        truncate_message(&failure, MAX_PROBE_ERROR_LEN)
    );
    report
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": ROOT_MESSAGE }))
}

async fn test_database_handler(State(state): State<AppState>) -> Json<DiagnosticReport> {
    Json(probe(state.store(), state.database_url_set(), state.probe_timeout()).await)
}

pub fn diagnostic_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/", get(root_handler))
        .route("/test", get(test_database_handler))
}
