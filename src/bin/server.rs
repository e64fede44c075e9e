use std::{fs, path::Path, process::ExitCode};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    AppState, Config, Environment, build_router, graceful_shutdown, logging_middleware,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    setup_logging(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), String> {
    let addr = config
        .socket_addr()
        .map_err(|error| format!("Could not determine the address to listen on: {error}"))?;

    create_parent_dir(&config.db_path)?;
    let connection = Connection::open(&config.db_path).map_err(|error| {
        format!(
            "Could not open database at {}: {error}",
            config.db_path.display()
        )
    })?;
    let state = AppState::new(connection)
        .map_err(|error| format!("Could not initialize the database: {error}"))?
        .with_session_duration(config.session_duration());

    let cors_layer = config
        .cors_layer()
        .map_err(|error| format!("Could not configure CORS: {error}"))?;

    let mut router = build_router(state);
    if config.log_requests {
        router = add_tracing_layer(router.layer(middleware::from_fn(logging_middleware)));
    }
    let router = router.layer(cors_layer);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    tracing::info!(
        "HTTP server listening on {addr} ({} mode, database {})",
        config.environment,
        config.db_path.display()
    );
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .map_err(|error| format!("Server error: {error}"))
}

fn setup_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    let registry = tracing_subscriber::registry().with(filter);

    match config.environment {
        Environment::Development => registry.with(fmt::layer().pretty()).init(),
        Environment::Production => registry.with(fmt::layer().compact()).init(),
    }
}

/// SQLite will not create missing directories for the database file.
fn create_parent_dir(db_path: &Path) -> Result<(), String> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|error| format!("Could not create {}: {error}", parent.display())),
        _ => Ok(()),
    }
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted to responses.
        .on_failure(());

    router.layer(tracing_layer)
}
