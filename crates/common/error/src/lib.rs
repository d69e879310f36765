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

use std::error::Error as StdError;

use http::StatusCode as HttpStatusCode;
use serde::Serialize;
use strum::EnumProperty;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Serialize,
    strum_macros::EnumProperty,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusCode {
    #[strum(props(http_status = "400"))]
    InvalidArgument,
    #[strum(props(http_status = "404"))]
    NotFound,
    #[strum(props(http_status = "413"))]
    PayloadTooLarge,
    #[strum(props(http_status = "500"))]
    Internal,
    #[strum(props(http_status = "500"))]
    Unknown,
}

impl StatusCode {
    pub fn http_status(self) -> HttpStatusCode {
        self.get_str("http_status")
            .and_then(|value| value.parse::<u16>().ok())
            .and_then(|value| HttpStatusCode::from_u16(value).ok())
            .unwrap_or(HttpStatusCode::INTERNAL_SERVER_ERROR)
    }

    #[must_use]
    pub const fn is_server_error(self) -> bool { matches!(self, Self::Internal | Self::Unknown) }
}

pub trait StackError: StdError {
    fn next(&self) -> Option<&dyn StackError>;

    fn last(&self) -> &dyn StackError
    where
        Self: Sized,
    {
        let Some(mut result) = self.next() else {
            return self;
        };
        while let Some(err) = result.next() {
            result = err;
        }
        result
    }
}

pub trait ErrorExt: StackError {
    fn status_code(&self) -> StatusCode { StatusCode::Unknown }

    /// Message that is safe to hand to an external caller.
    ///
    /// Joins the innermost error with the root of its source chain. Server
    /// errors are bounded to [`MAX_OUTPUT_MSG_LEN`] characters so driver
    /// messages can not flood a response body; client errors are returned
    /// whole so every offending field stays visible.
    fn output_msg(&self) -> String
    where
        Self: Sized,
    {
        let error = self.last();
        let msg = if let Some(external_error) = error.source() {
            let mut root = external_error;
            while let Some(source) = root.source() {
                root = source;
            }
            format!("{error}: {root}")
        } else {
            format!("{error}")
        };
        if self.status_code().is_server_error() {
            truncate_message(&msg, MAX_OUTPUT_MSG_LEN)
        } else {
            msg
        }
    }
}

/// Upper bound for server error messages returned by [`ErrorExt::output_msg`].
pub const MAX_OUTPUT_MSG_LEN: usize = 120;

/// Cuts `msg` down to at most `max_chars` characters, on a char boundary.
#[must_use]
pub fn truncate_message(msg: &str, max_chars: usize) -> String {
    match msg.char_indices().nth(max_chars) {
        Some((idx, _)) => msg[..idx].to_string(),
        None => msg.to_string(),
    }
}
