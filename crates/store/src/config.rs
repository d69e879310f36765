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

use std::time::Duration;

use smart_default::SmartDefault;

#[derive(Debug, Clone, SmartDefault, bon::Builder)]
#[builder(on(String, into), on(Duration, into))]
pub struct DatabaseConfig {
    /// SQLite connection url, e.g. `sqlite://thaispa.db` or `sqlite::memory:`
    #[default = "sqlite://thaispa.db"]
    #[builder(default = "sqlite://thaispa.db".to_string())]
    pub url: String,

    /// Maximum number of connections in the pool
    #[default = 10]
    #[builder(default = 10)]
    pub max_connections: u32,

    /// Minimum number of idle connections
    #[default = 1]
    #[builder(default = 1)]
    pub min_connections: u32,

    /// Connection timeout (default: 30 seconds)
    #[default(_code = "Duration::from_secs(30)")]
    #[builder(default = Duration::from_secs(30))]
    pub connect_timeout: Duration,

    /// Idle timeout for pooled connections; `None` keeps them open
    pub idle_timeout: Option<Duration>,
}

impl DatabaseConfig {
    /// Whether the url points at a private in-memory database.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        let url = self.url.as_str();
        url.contains(":memory:") || url.contains("mode=memory")
    }

    /// Human readable database name: the file stem of the database path,
    /// or `memory` for in-memory databases.
    #[must_use]
    pub fn database_name(&self) -> String {
        if self.is_memory() {
            return "memory".to_string();
        }
        let path = self
            .url
            .trim_start_matches("sqlite:")
            .trim_start_matches("//");
        let path = path.split('?').next().unwrap_or_default();
        std::path::Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("unknown")
            .to_string()
    }
}
