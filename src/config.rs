//! Server configuration read from command line flags or environment variables.

use std::{
    convert::Infallible,
    fmt::Display,
    net::{SocketAddr, ToSocketAddrs},
    path::PathBuf,
    str::FromStr,
};

use axum::http::{HeaderName, HeaderValue, Method, header::CONTENT_LENGTH};
use clap::{ArgAction, Parser, builder::BoolishValueParser};
use time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{Error, logging::SQL_LOG_TARGET};

/// The deployment environment, which controls how logs are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Human friendly, multi-line logs.
    Development,
    /// Compact, single line logs.
    Production,
}

impl FromStr for Environment {
    type Err = Infallible;

    /// Anything other than "production" is treated as development.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("production") {
            Ok(Self::Production)
        } else {
            Ok(Self::Development)
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// The REST API server for finance_tracker.
///
/// Every option can also be set with the environment variable shown in `--help`.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port to serve the API from.
    #[arg(long, env = "BACKEND_PORT", default_value_t = 6060)]
    pub port: u16,

    /// The host name or address to serve the API from.
    #[arg(long, env = "BACKEND_HOST", default_value = "localhost")]
    pub host: String,

    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH", default_value = "finance.db")]
    pub db_path: PathBuf,

    /// Log every request and response.
    #[arg(
        long,
        env = "LOG_REQUESTS",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub log_requests: bool,

    /// Log SQL statements.
    #[arg(
        long,
        env = "LOG_SQL",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub log_sql: bool,

    /// Log the CORS policy at startup.
    #[arg(
        long,
        env = "LOG_CORS",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub log_cors: bool,

    /// Comma separated origins allowed to call the API, "*" allows any origin.
    #[arg(long, env = "CORS_ALLOW_ORIGINS", default_value = "*")]
    pub cors_allow_origins: String,

    /// Comma separated HTTP methods allowed for cross-origin requests.
    #[arg(
        long,
        env = "CORS_ALLOW_METHODS",
        default_value = "GET,POST,PUT,PATCH,DELETE,HEAD,OPTIONS"
    )]
    pub cors_allow_methods: String,

    /// Comma separated request headers allowed for cross-origin requests.
    #[arg(
        long,
        env = "CORS_ALLOW_HEADERS",
        default_value = "Origin,Content-Length,Content-Type,Accept,Authorization,X-Requested-With"
    )]
    pub cors_allow_headers: String,

    /// How long, in seconds, browsers may cache a preflight response.
    #[arg(long, env = "CORS_MAX_AGE", default_value_t = 43200)]
    pub cors_max_age: u64,

    /// The deployment environment, "production" switches to compact logs.
    #[arg(long = "env", env = "ENV", default_value_t = Environment::Development)]
    pub environment: Environment,

    /// How many minutes a session token stays valid without being used.
    #[arg(
        long,
        env = "SESSION_DURATION_MINUTES",
        default_value_t = 1440,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub session_duration_minutes: u32,
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

impl Config {
    /// Resolve the host and port to the address to listen on.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if the host cannot be resolved.
    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|error| {
                Error::InvalidConfig(format!("could not resolve host {}: {error}", self.host))
            })?
            .next()
            .ok_or_else(|| Error::InvalidConfig(format!("no address found for {}", self.host)))
    }

    /// How long a session token stays valid without being used.
    pub fn session_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.session_duration_minutes))
    }

    /// The default `tracing` filter directives, used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> String {
        let mut directives = vec![format!("{}=info", env!("CARGO_CRATE_NAME"))];

        if self.log_requests {
            directives.push("tower_http=debug".to_owned());
        }

        if self.log_sql {
            directives.push(format!("{SQL_LOG_TARGET}=debug"));
        }

        directives.join(",")
    }

    /// Build the CORS layer for the router.
    ///
    /// Credentials are never allowed and `Content-Length` is exposed to scripts.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if an origin, method or header cannot be parsed.
    pub fn cors_layer(&self) -> Result<CorsLayer, Error> {
        let origins = split_list(&self.cors_allow_origins).collect::<Vec<_>>();
        let allow_origin = if origins.contains(&"*") {
            AllowOrigin::any()
        } else {
            let origins = origins
                .into_iter()
                .map(|origin| {
                    HeaderValue::from_str(origin).map_err(|error| {
                        Error::InvalidConfig(format!("invalid CORS origin \"{origin}\": {error}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowOrigin::list(origins)
        };

        let methods = split_list(&self.cors_allow_methods)
            .map(|method| {
                Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|error| {
                    Error::InvalidConfig(format!("invalid CORS method \"{method}\": {error}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let headers = split_list(&self.cors_allow_headers)
            .map(|header| {
                HeaderName::from_bytes(header.as_bytes()).map_err(|error| {
                    Error::InvalidConfig(format!("invalid CORS header \"{header}\": {error}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.log_cors {
            tracing::info!(
                "CORS policy: origins={:?} methods={:?} headers={:?} max_age={}s",
                self.cors_allow_origins,
                methods,
                headers,
                self.cors_max_age
            );
        }

        Ok(CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .expose_headers([CONTENT_LENGTH])
            .allow_credentials(false)
            .max_age(std::time::Duration::from_secs(self.cors_max_age)))
    }
}
