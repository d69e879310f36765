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

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use bon::Builder;
use smart_default::SmartDefault;
use snafu::{ResultExt, Whatever};
use thaispa_server::{
    AppState,
    http::{RestServerConfig, SITE_ROUTES, start_rest_server},
    state::DEFAULT_PROBE_TIMEOUT,
};
use thaispa_store::{DatabaseConfig, DocumentStore, SqliteDocumentStore};
use tokio::{sync::oneshot, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Represents the main application with lifecycle management
#[derive(SmartDefault)]
pub struct App {
    /// Application configuration
    pub config:             AppConfig,
    /// Controls if the application should continue running
    #[default(_code = "Arc::new(AtomicBool::new(false))")]
    pub running:            Arc<AtomicBool>,
    /// Cancellation token for graceful shutdown
    #[default(_code = "CancellationToken::new()")]
    pub cancellation_token: CancellationToken,
}

/// Configuration for the application
#[derive(Debug, Clone, SmartDefault, Builder)]
pub struct AppConfig {
    /// REST server configuration
    #[builder(default)]
    pub http_config:              RestServerConfig,
    /// Document database; `None` runs the site without persistence
    pub database:                 Option<DatabaseConfig>,
    /// Upper bound for the `/test` collection listing
    #[default(_code = "DEFAULT_PROBE_TIMEOUT")]
    #[builder(default = DEFAULT_PROBE_TIMEOUT)]
    pub probe_timeout:            Duration,
    /// Whether to listen for Ctrl+C / SIGTERM
    #[default = true]
    #[builder(default = true)]
    pub enable_graceful_shutdown: bool,
}

impl AppConfig {
    #[must_use]
    pub fn open(self) -> App {
        App {
            config: self,
            ..Default::default()
        }
    }
}

/// Handle for controlling a running application
pub struct AppHandle {
    /// Sender for triggering shutdown
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Application running flag
    running:     Arc<AtomicBool>,
    /// Task that tears the servers and the store down
    lifecycle:   Option<JoinHandle<()>>,
    /// Address the REST server is bound to
    local_addr:  SocketAddr,
}

impl AppHandle {
    /// Trigger a graceful shutdown without waiting for it
    pub fn shutdown(&mut self) {
        info!("Initiating graceful shutdown");
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Check if the application is still running
    #[must_use]
    pub fn is_running(&self) -> bool { self.running.load(Ordering::SeqCst) }

    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr { self.local_addr }

    /// Wait until the server has stopped and the store is closed
    pub async fn wait_for_shutdown(&mut self) {
        let Some(lifecycle) = self.lifecycle.take() else {
            return;
        };
        if let Err(e) = lifecycle.await {
            error!("Shutdown task failed: {e}");
        }
    }
}

/// Connects the configured store. A database that can not be reached leaves
/// the site running without persistence.
async fn open_store(config: Option<&DatabaseConfig>) -> Option<Arc<dyn DocumentStore>> {
    let config = config?;
    match SqliteDocumentStore::connect(config).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Database unavailable, inquiries will be rejected: {e}");
            None
        }
    }
}

impl App {
    /// Start the application and return a handle for controlling it
    async fn start(&self) -> Result<AppHandle, Whatever> {
        info!("Starting thaispa application");

        let store = open_store(self.config.database.as_ref()).await;
        let state = AppState::builder()
            .maybe_store(store.clone())
            .database_url_set(self.config.database.is_some())
            .probe_timeout(self.config.probe_timeout)
            .build();

        let mut http_handle =
            start_rest_server(self.config.http_config.clone(), state, &SITE_ROUTES)
                .await
                .whatever_context("Failed to start REST server")?;
        http_handle
            .wait_for_start()
            .await
            .whatever_context("REST server did not start")?;
        let local_addr = http_handle.local_addr();

        self.running.store(true, Ordering::SeqCst);
        info!("Application started successfully on {local_addr}");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let running = Arc::clone(&self.running);
        let cancellation_token = self.cancellation_token.clone();
        let enable_graceful_shutdown = self.config.enable_graceful_shutdown;

        let lifecycle = tokio::spawn(async move {
            if enable_graceful_shutdown {
                shutdown_signal(shutdown_rx, cancellation_token.clone()).await;
            } else {
                tokio::select! {
                    _ = shutdown_rx => {},
                    () = cancellation_token.cancelled() => {},
                }
            }

            info!("Shutting down servers");
            http_handle.shutdown();
            if let Err(e) = http_handle.wait_for_stop().await {
                error!("REST server did not stop cleanly: {e}");
            }
            if let Some(store) = store {
                store.close().await;
            }

            running.store(false, Ordering::SeqCst);
            cancellation_token.cancel();
            info!("Application shutdown complete");
        });

        Ok(AppHandle {
            shutdown_tx: Some(shutdown_tx),
            running: Arc::clone(&self.running),
            lifecycle: Some(lifecycle),
            local_addr,
        })
    }

    /// Run the application blocking until it's shut down
    pub async fn run(self) -> Result<(), Whatever> {
        let mut handle = self.start().await?;
        handle.wait_for_shutdown().await;
        Ok(())
    }
}

async fn shutdown_signal(shutdown_rx: oneshot::Receiver<()>, cancelled: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C signal"); },
        () = terminate => { info!("Received terminate signal"); },
        () = cancelled.cancelled() => { info!("Cancellation requested"); },
        _ = shutdown_rx => { info!("Received shutdown signal"); },
    }
}
