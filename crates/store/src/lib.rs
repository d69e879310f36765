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

//! Document storage used by the HTTP layer.
//!
//! [`DocumentStore`] is the narrow create/read interface handlers depend on;
//! [`SqliteDocumentStore`] is the production implementation, keeping every
//! document as a JSON body tagged with its collection name.

mod config;
mod document;
mod err;
mod sqlite;

pub use config::DatabaseConfig;
pub use document::{Document, DocumentStore};
pub use err::{Error, Result};
pub use sqlite::SqliteDocumentStore;
