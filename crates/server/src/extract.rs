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
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use validator::Validate;

use crate::error::{ApiError, ValidationSnafu};

/// Types accepted through [`ValidatedJson`].
pub trait Schema: DeserializeOwned + Validate {
    /// Entity name used in error messages, e.g. `"inquiry"`.
    const ENTITY: &'static str;
}

/// JSON body extractor that decodes `T` and then checks its declared
/// constraints. Any failure becomes an [`ApiError`] before the handler runs.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Schema,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate().context(ValidationSnafu {
            entity: T::ENTITY,
        })?;
        Ok(Self(value))
    }
}
