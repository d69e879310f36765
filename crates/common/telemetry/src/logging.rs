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
    env,
    io::IsTerminal,
    sync::{Arc, Mutex, Once},
};

use bon::Builder;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, filter, layer::SubscriberExt, prelude::*};

/// Default log level filter when neither `LoggingOptions::level` nor
/// `RUST_LOG` is set.
const DEFAULT_LOG_TARGETS: &str = "info,sqlx=warn,hyper=warn,tower=warn";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, SmartDefault, Builder)]
#[serde(default)]
pub struct LoggingOptions {
    /// Directory path for storing log files.
    ///
    /// When non-empty, log files are created here with hourly rotation,
    /// plus a separate error-only file. When empty, only stdout is used.
    #[default = ""]
    #[builder(default, into)]
    pub dir: String,

    /// Log level filter string, e.g. `"info"` or `"info,thaispa_server=debug"`.
    ///
    /// Falls back to `RUST_LOG`, then to a built-in default.
    #[builder(into)]
    pub level: Option<String>,

    /// Output format for log messages.
    #[builder(default)]
    pub log_format: LogFormat,

    /// Maximum number of rotated log files to retain (30 days of hourly
    /// files by default).
    #[default = 720]
    #[builder(default = 720)]
    pub max_log_files: usize,

    /// Whether to write logs to stdout in addition to files.
    #[default = true]
    #[builder(default = true)]
    pub append_stdout: bool,
}

#[derive(
    Clone,
    Debug,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    derive_more::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per line, for log aggregation.
    #[display("json")]
    Json,

    /// Human-readable text.
    #[default]
    #[display("text")]
    Text,
}

/// Storage for unit-test worker guards so they outlive each test.
static GLOBAL_UT_LOG_GUARD: Lazy<Arc<Mutex<Option<Vec<WorkerGuard>>>>> =
    Lazy::new(|| Arc::new(Mutex::new(None)));

pub fn init_default_ut_logging() {
    static START: Once = Once::new();

    START.call_once(|| {
        let mut g = GLOBAL_UT_LOG_GUARD.as_ref().lock().unwrap();

        let level = env::var("UNITTEST_LOG_LEVEL").unwrap_or_else(|_| {
            "debug,hyper=warn,tower=warn,reqwest=warn,sqlx=info,h2=info".to_string()
        });
        let opts = LoggingOptions {
            dir: env::var("UNITTEST_LOG_DIR").unwrap_or_default(),
            level: Some(level),
            ..Default::default()
        };
        *g = Some(init_global_logging("unittest", &opts));
    });
}

fn rolling_appender(prefix: &str, opts: &LoggingOptions) -> RollingFileAppender {
    RollingFileAppender::builder()
        .rotation(Rotation::HOURLY)
        .filename_prefix(prefix)
        .max_log_files(opts.max_log_files)
        .build(&opts.dir)
        .unwrap_or_else(|e| {
            panic!(
                "initializing rolling file appender at {} failed: {}",
                &opts.dir, e
            )
        })
}

/// Installs the global tracing subscriber.
///
/// Layers, depending on `opts`:
///
/// - stdout (if `append_stdout`)
/// - hourly rotated `<app_name>` files (if `dir` is set)
/// - hourly rotated `<app_name>-err` files holding only ERROR events (if
///   `dir` is set)
///
/// Only the first call has any effect; the returned guards must be kept
/// alive for as long as logs should be flushed.
///
/// # Panics
///
/// Panics if the log directory can not be created, the level string does not
/// parse, or another global subscriber was already installed.
pub fn init_global_logging(app_name: &str, opts: &LoggingOptions) -> Vec<WorkerGuard> {
    static START: Once = Once::new();
    let mut guards = vec![];

    START.call_once(|| {
        LogTracer::init().expect("log tracer must be valid");

        let stdout_logging_layer = if opts.append_stdout {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            guards.push(guard);

            if opts.log_format == LogFormat::Json {
                Some(
                    tracing_subscriber::fmt::Layer::new()
                        .json()
                        .with_writer(writer)
                        .with_ansi(std::io::stdout().is_terminal())
                        .with_current_span(true)
                        .with_span_list(true)
                        .boxed(),
                )
            } else {
                Some(
                    tracing_subscriber::fmt::Layer::new()
                        .with_writer(writer)
                        .with_ansi(std::io::stdout().is_terminal())
                        .boxed(),
                )
            }
        } else {
            None
        };

        let file_logging_layer = if opts.dir.is_empty() {
            None
        } else {
            let (writer, guard) = tracing_appender::non_blocking(rolling_appender(app_name, opts));
            guards.push(guard);

            if opts.log_format == LogFormat::Json {
                Some(
                    tracing_subscriber::fmt::Layer::new()
                        .json()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_current_span(true)
                        .with_span_list(true)
                        .boxed(),
                )
            } else {
                Some(
                    tracing_subscriber::fmt::Layer::new()
                        .with_writer(writer)
                        .with_ansi(false)
                        .boxed(),
                )
            }
        };

        let err_file_logging_layer = if opts.dir.is_empty() {
            None
        } else {
            let (writer, guard) = tracing_appender::non_blocking(rolling_appender(
                &format!("{app_name}-err"),
                opts,
            ));
            guards.push(guard);

            if opts.log_format == LogFormat::Json {
                Some(
                    tracing_subscriber::fmt::Layer::new()
                        .json()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(filter::LevelFilter::ERROR)
                        .boxed(),
                )
            } else {
                Some(
                    tracing_subscriber::fmt::Layer::new()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(filter::LevelFilter::ERROR)
                        .boxed(),
                )
            }
        };

        let filter = opts
            .level
            .as_deref()
            .or(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
            .unwrap_or(DEFAULT_LOG_TARGETS)
            .parse::<filter::Targets>()
            .expect("error parsing log level string");

        let subscriber = Registry::default()
            .with(filter)
            .with(stdout_logging_layer)
            .with(file_logging_layer)
            .with(err_file_logging_layer);

        tracing::subscriber::set_global_default(subscriber)
            .expect("error setting global tracing subscriber");

        tracing::info!(app = app_name, format = %opts.log_format, "logging initialized");
    });

    guards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = LoggingOptions::default();
        assert!(opts.dir.is_empty());
        assert!(opts.append_stdout);
        assert_eq!(opts.max_log_files, 720);
        assert_eq!(opts.log_format, LogFormat::Text);
        assert_eq!(opts, LoggingOptions::builder().build());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: LoggingOptions =
            serde_json::from_str(r#"{"level":"debug","log_format":"json"}"#).unwrap();
        assert_eq!(opts.level.as_deref(), Some("debug"));
        assert_eq!(opts.log_format, LogFormat::Json);
        assert!(opts.append_stdout);
    }

    #[test]
    fn test_only_first_init_installs() {
        init_default_ut_logging();
        let guards = init_global_logging("again", &LoggingOptions::default());
        assert!(guards.is_empty());
        tracing::info!("still logging through the first subscriber");
    }
}
