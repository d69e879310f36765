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

use axum::{Json, extract::rejection::JsonRejection, response::IntoResponse};
use serde::Serialize;
use snafu::Snafu;
use strum::EnumProperty;
use thaispa_error::{ErrorExt, StackError, StatusCode};
use validator::ValidationErrors;

use crate::inquiry::IntakeError;

/// One violated constraint on a request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub code:  String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code:   StatusCode,
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldViolation>,
}

#[derive(Debug, Snafu, strum_macros::EnumProperty)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(display("Invalid request body: {reason}"))]
    #[strum(props(status_code = "invalid_argument"))]
    InvalidBody { reason: String },

    #[snafu(display("Request body exceeds the configured limit"))]
    #[strum(props(status_code = "payload_too_large"))]
    PayloadTooLarge,

    #[snafu(display("Invalid {entity}"))]
    #[strum(props(status_code = "invalid_argument"))]
    Validation {
        entity: &'static str,
        source: ValidationErrors,
    },

    #[snafu(display("Not found: {resource}"))]
    #[strum(props(status_code = "not_found"))]
    NotFound { resource: String },

    #[snafu(display("Failed to persist {entity}"))]
    #[strum(props(status_code = "internal"))]
    Persistence {
        entity: &'static str,
        source: IntakeError,
    },
}

impl ApiError {
    /// Field-level detail for validation failures, sorted by field name.
    #[must_use]
    pub fn field_violations(&self) -> Vec<FieldViolation> {
        let Self::Validation { source, .. } = self else {
            return Vec::new();
        };
        let mut violations: Vec<_> = source
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldViolation {
                    field: field.to_string(),
                    code:  error.code.to_string(),
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
        violations
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::InvalidBody {
                reason: rejection.body_text(),
            }
        }
    }
}

impl ErrorExt for ApiError {
    fn status_code(&self) -> StatusCode {
        self.get_str("status_code")
            .and_then(|value| value.parse().ok())
            .unwrap_or(StatusCode::Unknown)
    }
}

impl StackError for ApiError {
    fn next(&self) -> Option<&dyn StackError> { None }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let code = self.status_code();
        if code.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = Json(ErrorBody {
            code,
            detail: self.output_msg(),
            fields: self.field_violations(),
        });
        (code.http_status(), body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use thaispa_error::MAX_OUTPUT_MSG_LEN;
    use validator::ValidationError;

    use super::*;

    async fn response_body(err: ApiError) -> (axum::http::StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_codes() {
        let err = ApiError::InvalidBody {
            reason: "expected value".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::InvalidArgument);
        assert_eq!(err.output_msg(), "Invalid request body: expected value");

        assert_eq!(
            ApiError::PayloadTooLarge.status_code(),
            StatusCode::PayloadTooLarge
        );
        assert_eq!(
            ApiError::NotFound {
                resource: "/nope".to_string()
            }
            .status_code()
            .http_status(),
            axum::http::StatusCode::NOT_FOUND
        );

        let err = ApiError::Persistence {
            entity: "inquiry",
            source: IntakeError::StoreUnavailable,
        };
        assert_eq!(err.status_code(), StatusCode::Internal);
        assert_eq!(
            err.output_msg(),
            "Failed to persist inquiry: Database not available"
        );
    }

    #[test]
    fn test_field_violations_are_sorted() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("length"));
        errors.add("email", ValidationError::new("email"));
        let err = ApiError::Validation {
            entity: "inquiry",
            source: errors,
        };
        assert_eq!(err.status_code(), StatusCode::InvalidArgument);
        assert_eq!(
            err.field_violations(),
            vec![
                FieldViolation {
                    field: "email".to_string(),
                    code:  "email".to_string(),
                },
                FieldViolation {
                    field: "name".to_string(),
                    code:  "length".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_client_detail_is_whole_and_server_detail_is_bounded() {
        let reason = format!(
            "Failed to deserialize the JSON body into the target type: {}",
            "name: invalid type: integer `7`, expected a string at line 1 column 9; ".repeat(3)
        );
        let (status, body) = response_body(ApiError::InvalidBody {
            reason: reason.clone(),
        })
        .await;
        assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.chars().count() > MAX_OUTPUT_MSG_LEN);
        assert_eq!(detail, format!("Invalid request body: {reason}"));

        let (status, body) = response_body(ApiError::Persistence {
            entity: "inquiry",
            source: IntakeError::Write {
                source: sqlx::Error::Protocol("x".repeat(500)).into(),
            },
        })
        .await;
        assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert_eq!(detail.chars().count(), MAX_OUTPUT_MSG_LEN);
        assert!(detail.starts_with("Failed to persist inquiry: "));
    }
}
