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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::err::Result;

/// A stored document together with its storage-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id:         String,
    pub collection: String,
    /// The JSON body as written, including the `created_at`/`updated_at`
    /// stamps added on insert.
    pub body:       Value,
}

/// Narrow create/read interface over a document database.
///
/// Implementations are shared by every request handler behind an `Arc`, so
/// they must be cheap to call concurrently.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Name of the underlying database, for diagnostics.
    fn name(&self) -> &str;

    /// Inserts `data` into `collection` and returns the new document id.
    ///
    /// Exactly one write is attempted. On `Ok` the document is durable; on
    /// `Err` nothing was stored.
    async fn create_document(&self, collection: &str, data: &Value) -> Result<String>;

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Names of all collections that hold at least one document, sorted.
    async fn list_collection_names(&self) -> Result<Vec<String>>;

    /// Releases pooled resources. Default is a no-op.
    async fn close(&self) {}
}
