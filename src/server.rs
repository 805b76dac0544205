use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use anyhow::Context;
use axum::{middleware, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    decompression::RequestDecompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use crate::{
    cli_args::CliArgs,
    error::ErrorVerbosity,
    middleware::{
        method_not_allowed::method_not_allowed, not_found::not_found,
        trace_headers::trace_headers, trace_response_body::trace_response_body,
    },
    repository::BookRepository,
    route,
    state::ApiState,
    storage::JsonFileStorage,
};

fn default_socket_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000)
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_create_data_file() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_socket_address")]
    socket_address: SocketAddr,
    #[serde(default)]
    error_verbosity: ErrorVerbosity,
    /// JSON file holding the books.
    #[serde(default = "default_data_file")]
    data_file: PathBuf,
    /// Create the data file with an empty collection on startup if it is missing.
    #[serde(default = "default_create_data_file")]
    create_data_file: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_address: default_socket_address(),
            error_verbosity: ErrorVerbosity::default(),
            data_file: default_data_file(),
            create_data_file: default_create_data_file(),
        }
    }
}

impl ServerConfig {
    pub async fn from_config_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file `{}`", path.display()))?;

        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file `{}`", path.display()))?;

        Ok(config)
    }

    /// Loads the configuration file if one was given and applies the CLI overrides.
    pub async fn from_cli_args(args: CliArgs) -> anyhow::Result<Self> {
        let mut config = match args.config_file {
            Some(path) => Self::from_config_file(path).await?,
            None => Self::default(),
        };

        if let Some(socket_address) = args.socket_address {
            config.socket_address = socket_address;
        }

        if let Some(data_file) = args.data_file {
            config.data_file = data_file;
        }

        Ok(config)
    }
}

/// Builds the complete application with all routes and middlewares.
pub fn app(state: ApiState) -> Router {
    Router::new()
        .merge(route::books::app::app())
        .merge(route::openapi::app())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            method_not_allowed::<ApiState>,
        ))
        .layer(middleware::from_fn(trace_headers))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trace_response_body::<ApiState>,
        ))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                        .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                        .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
                )
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
}

pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let storage = JsonFileStorage::new(&self.config.data_file);

        if self.config.create_data_file {
            storage
                .ensure_exists()
                .await
                .context("Failed to initialize data file")?;
        }

        tracing::info!(data_file = %storage.path().display(), "Using data file");

        let state = ApiState::new(self.config.error_verbosity, BookRepository::new(storage));

        let app = app(state);

        let listener = TcpListener::bind(&self.config.socket_address)
            .await
            .context("Bind failed")?;

        tracing::info!(addr = %self.config.socket_address, "Server is running");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");

        tracing::info!("CTRL+C received");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;

        tracing::info!("SIGTERM received");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
