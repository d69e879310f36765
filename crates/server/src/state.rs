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

use std::{sync::Arc, time::Duration};

use thaispa_store::DocumentStore;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-wide state shared by every request handler.
///
/// The store handle is created once at startup and only ever read here.
/// `None` means no database was configured or connecting to it failed.
#[derive(Clone, bon::Builder)]
pub struct AppState {
    store:            Option<Arc<dyn DocumentStore>>,
    /// Whether a database url was supplied, reported by the diagnostic probe
    #[builder(default)]
    database_url_set: bool,
    /// Upper bound for the diagnostic collection listing
    #[builder(default = DEFAULT_PROBE_TIMEOUT)]
    probe_timeout:    Duration,
}

impl AppState {
    #[must_use]
    pub fn store(&self) -> Option<&dyn DocumentStore> { self.store.as_deref() }

    #[must_use]
    pub const fn database_url_set(&self) -> bool { self.database_url_set }

    #[must_use]
    pub const fn probe_timeout(&self) -> Duration { self.probe_timeout }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.as_ref().map(|store| store.name()))
            .field("database_url_set", &self.database_url_set)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}
