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

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use snafu::{ResultExt, ensure};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use uuid::Uuid;

use crate::{
    config::DatabaseConfig,
    document::{Document, DocumentStore},
    err::*,
};

#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    name: String,
}

impl SqliteDocumentStore {
    /// Connects to the database described by `config` and applies the
    /// embedded migrations.
    #[tracing::instrument(level = "debug", skip_all, fields(url = %config.url), err)]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .context(InvalidUrlSnafu {
                url: config.url.clone(),
            })?
            .create_if_missing(true);

        // Every connection to `:memory:` opens its own database, so an
        // in-memory store must stay on one connection that is never recycled.
        let pool_options = if config.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .idle_timeout(config.idle_timeout)
        };

        let pool = pool_options
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let name = config.database_name();
        tracing::info!(database = %name, "document store ready");

        Ok(Self { pool, name })
    }
}

/// Adds `created_at`/`updated_at` to a document body.
fn stamp(collection: &str, data: &Value) -> Result<(Value, String)> {
    let Value::Object(fields) = data else {
        return NotAnObjectSnafu { collection }.fail();
    };
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut fields = fields.clone();
    fields.insert("created_at".to_string(), Value::String(now.clone()));
    fields.insert("updated_at".to_string(), Value::String(now.clone()));
    Ok((Value::Object(fields), now))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn name(&self) -> &str { &self.name }

    async fn create_document(&self, collection: &str, data: &Value) -> Result<String> {
        ensure!(!collection.trim().is_empty(), EmptyCollectionSnafu);

        let (body, created_at) = stamp(collection, data)?;
        let body = serde_json::to_string(&body).context(CodecSnafu)?;
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO documents (id, collection, body, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(collection)
            .bind(body)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(%collection, %id, "document created");
        Ok(id)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((body,)) => {
                let body = serde_json::from_str(&body).context(CodecSnafu)?;
                Ok(Some(Document {
                    id: id.to_string(),
                    collection: collection.to_string(),
                    body,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT collection FROM documents ORDER BY collection")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!(database = %self.name, "document store closed");
    }
}
