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

use clap::{Args, Parser, Subcommand};
use snafu::{ResultExt, Whatever};

mod build_info;
use thaispa_app::AppConfig;
use thaispa_base::ReadableSize;
use thaispa_common_telemetry::{LogFormat, LoggingOptions, init_global_logging, set_panic_hook};
use thaispa_server::{catalog::list_services, http::RestServerConfig};
use thaispa_store::DatabaseConfig;

#[derive(Debug, Parser)]
#[clap(
name = "thaispa",
about = "Backend for the Thai Massage Budapest website",
author = build_info::AUTHOR,
version = build_info::VERSION,
long_version = build_info::LONG_VERSION)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Services(ServicesArgs),
    Server(ServerArgs),
}

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Print the service catalog as JSON.
Examples:

thaispa services

")]
struct ServicesArgs {
    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

impl ServicesArgs {
    fn run(&self) -> Result<(), Whatever> {
        let services = list_services();
        let json = if self.pretty {
            serde_json::to_string_pretty(services)
        } else {
            serde_json::to_string(services)
        }
        .whatever_context("Failed to encode services")?;
        println!("{json}");
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Starts the thaispa HTTP server.
Examples:

thaispa server
PORT=9000 DATABASE_URL=sqlite://thaispa.db thaispa server

")]
struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host:          String,
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port:          u16,
    /// Document database url; inquiries are rejected when unset
    #[arg(long, env = "DATABASE_URL")]
    database_url:  Option<String>,
    /// Maximum accepted request body size
    #[arg(long, env = "MAX_BODY_SIZE", default_value = "1MiB")]
    max_body_size: ReadableSize,
    /// Log filter, e.g. `info,thaispa_server=debug`
    #[arg(long, env = "LOG_LEVEL")]
    log_level:     Option<String>,
    /// Directory for rotated log files; stdout only when empty
    #[arg(long, env = "LOG_DIR", default_value = "")]
    log_dir:       String,
    /// `text` or `json`
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format:    LogFormat,
}

impl ServerArgs {
    fn logging_options(&self) -> LoggingOptions {
        LoggingOptions::builder()
            .dir(self.log_dir.clone())
            .maybe_level(self.log_level.clone())
            .log_format(self.log_format)
            .build()
    }

    fn app_config(&self) -> AppConfig {
        AppConfig::builder()
            .http_config(
                RestServerConfig::builder()
                    .bind_address(format!("{}:{}", self.host, self.port))
                    .max_body_size(self.max_body_size)
                    .build(),
            )
            .maybe_database(
                self.database_url
                    .as_deref()
                    .filter(|url| !url.trim().is_empty())
                    .map(|url| DatabaseConfig::builder().url(url).build()),
            )
            .build()
    }

    async fn run(&self) -> Result<(), Whatever> {
        let _guards = init_global_logging("thaispa", &self.logging_options());
        set_panic_hook();

        let app = self.app_config().open();
        app.run().await
    }
}

#[tokio::main]
async fn main() -> Result<(), Whatever> {
    // a missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    match cli.commands {
        Commands::Services(sa) => sa.run(),
        Commands::Server(sa) => sa.run().await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn server_args(args: &[&str]) -> ServerArgs {
        let cli = Cli::try_parse_from(["thaispa", "server"].iter().chain(args)).unwrap();
        match cli.commands {
            Commands::Server(sa) => sa,
            Commands::Services(_) => panic!("expected server command"),
        }
    }

    #[test]
    fn verify_cli() { Cli::command().debug_assert(); }

    #[test]
    fn test_server_args_to_config() {
        let args = server_args(&[
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--database-url",
            "sqlite://bookings.db",
            "--max-body-size",
            "64KiB",
            "--log-format",
            "json",
        ]);
        let config = args.app_config();
        assert_eq!(config.http_config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.http_config.max_body_size, ReadableSize::kb(64));
        assert_eq!(config.database.unwrap().url, "sqlite://bookings.db");

        let logging = args.logging_options();
        assert_eq!(logging.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_database_url_disables_store() {
        let args = server_args(&["--database-url", "  "]);
        assert!(args.app_config().database.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["thaispa", "server", "--port", "eighty"]).is_err());
        assert!(Cli::try_parse_from(["thaispa", "server", "--max-body-size", "lots"]).is_err());
        assert!(Cli::try_parse_from(["thaispa", "server", "--log-format", "xml"]).is_err());
    }
}
