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

pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod http;
pub mod inquiry;
pub mod state;

use std::net::SocketAddr;

use snafu::{OptionExt, ResultExt, Snafu};
use tokio::{sync::oneshot::Receiver, task::JoinHandle};
use tokio_util::sync::CancellationToken;

pub use crate::state::AppState;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(transparent)]
    Network { source: NetworkError },

    #[snafu(display("Server start signal already consumed or dropped"))]
    StartSignal,

    #[snafu(display("Server task failed"))]
    Join { source: tokio::task::JoinError },
}

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum NetworkError {
    #[snafu(display("Failed to bind {addr}"))]
    BindError {
        addr:   String,
        #[snafu(source)]
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse address {addr}"))]
    ParseAddressError {
        addr:   String,
        #[snafu(source)]
        source: std::net::AddrParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Handle for a running HTTP server.
///
/// Allows waiting for the server to accept connections, signalling graceful
/// shutdown through a cancellation token, and waiting for the server task to
/// finish.
pub struct ServiceHandler {
    /// Join handle for the server task
    join_handle:        JoinHandle<()>,
    /// Token for signalling shutdown
    cancellation_token: CancellationToken,
    /// Receiver for server start notification
    started_rx:         Option<Receiver<()>>,
    /// Address the listener is actually bound to
    local_addr:         SocketAddr,
}

impl ServiceHandler {
    /// Waits for the server to start accepting connections.
    ///
    /// Fails if called more than once, or if the server task ended before
    /// it could signal readiness.
    pub async fn wait_for_start(&mut self) -> Result<()> {
        let started_rx = self.started_rx.take().context(StartSignalSnafu)?;
        started_rx.await.ok().context(StartSignalSnafu)
    }

    /// Waits for the server task to finish. Call [`Self::shutdown`] first.
    pub async fn wait_for_stop(self) -> Result<()> { self.join_handle.await.context(JoinSnafu) }

    /// Signals the server to begin graceful shutdown without waiting for it.
    pub fn shutdown(&self) { self.cancellation_token.cancel(); }

    /// Whether the server task has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool { self.join_handle.is_finished() }

    /// The bound address; differs from the configured one when port 0 was
    /// requested.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr { self.local_addr }
}
