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

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use snafu::ResultExt;
use thaispa_base::ReadableSize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::ServiceHandler;
use crate::{
    BindSnafu, ParseAddressSnafu, Result,
    catalog::catalog_routes,
    diagnostics::diagnostic_routes,
    error::ApiError,
    inquiry::inquiry_routes,
    state::AppState,
};

pub const DEFAULT_MAX_HTTP_BODY_SIZE: ReadableSize = ReadableSize::mb(1);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, SmartDefault, bon::Builder)]
pub struct RestServerConfig {
    /// The address to bind the REST server
    #[default = "0.0.0.0:8000"]
    #[builder(default = "0.0.0.0:8000".to_string(), into)]
    pub bind_address:  String,
    /// Maximum HTTP request body size
    #[default(_code = "DEFAULT_MAX_HTTP_BODY_SIZE")]
    #[builder(default = DEFAULT_MAX_HTTP_BODY_SIZE)]
    pub max_body_size: ReadableSize,
    /// Whether to enable CORS
    #[default = true]
    #[builder(default = true)]
    pub enable_cors:   bool,
}

/// Every route group the site serves.
pub const SITE_ROUTES: [fn(Router<AppState>) -> Router<AppState>; 4] = [
    health_routes,
    diagnostic_routes,
    catalog_routes,
    inquiry_routes,
];

/// Builds the router: registered routes first, then the 404 fallback and
/// the middleware stack, so layers cover every route.
pub fn api_router<F>(config: &RestServerConfig, state: AppState, route_handlers: &[F]) -> Router
where
    F: Fn(Router<AppState>) -> Router<AppState>,
{
    let mut router = Router::new();
    for handler in route_handlers {
        router = handler(router);
    }

    let body_limit = usize::try_from(config.max_body_size.as_bytes()).unwrap_or(usize::MAX);
    let mut router = router
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ));

    if config.enable_cors {
        // Credentials can not be combined with wildcards, so the request's
        // own origin, method and headers are echoed back instead.
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true);
        router = router.layer(cors);
    }

    router.with_state(state)
}

pub async fn start_rest_server<F>(
    config: RestServerConfig,
    state: AppState,
    route_handlers: &[F],
) -> Result<ServiceHandler>
where
    F: Fn(Router<AppState>) -> Router<AppState>,
{
    // Parse bind address
    let bind_addr = config
        .bind_address
        .parse::<std::net::SocketAddr>()
        .context(ParseAddressSnafu {
            addr: config.bind_address.clone(),
        })?;

    let router = api_router(&config, state, route_handlers);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .context(BindSnafu {
            addr: config.bind_address.clone(),
        })?;
    let local_addr = listener.local_addr().context(BindSnafu {
        addr: config.bind_address.clone(),
    })?;

    // Spawn the server task
    let cancellation_token = CancellationToken::new();
    let (join_handle, started_rx) = {
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let cancellation_token_clone = cancellation_token.clone();
        let join_handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    info!("REST server (on {}) starting", local_addr);
                    let _ = started_tx.send(());
                    info!("REST server (on {}) started", local_addr);
                    cancellation_token_clone.cancelled().await;
                    info!("REST server (on {}) received shutdown signal", local_addr);
                })
                .await;

            info!(
                "REST server (on {}) task completed: {:?}",
                local_addr, result
            );
        });
        (join_handle, started_rx)
    };

    Ok(ServiceHandler {
        join_handle,
        cancellation_token,
        started_rx: Some(started_rx),
        local_addr,
    })
}

async fn health_check() -> impl IntoResponse { (StatusCode::OK, "OK") }

async fn api_health_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "thaispa",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn fallback_handler(uri: Uri) -> ApiError {
    ApiError::NotFound {
        resource: uri.path().to_string(),
    }
}

pub fn health_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_handler))
}
