#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod route;
mod session;
mod store;
mod trace;


use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{extract::Request, Extension, Router, ServiceExt};
use tower::Layer;
use tower_http::{
	compression::CompressionLayer,
	normalize_path::{NormalizePath, NormalizePathLayer},
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{config::Config, store::Store};

pub type Database = Arc<dyn Store>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store and a hash configuration (since it's expensive to create).
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
}

impl State {
	pub fn new(database: Database) -> Self {
		Self {
			database,
			hasher: Argon2::default(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
enum InitError {
	#[error("configuration error: {0}")]
	Config(#[from] config::Error),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("error binding tcp listener: {0}")]
	TcpBind(std::io::Error),
	#[error("error serving server: {0}")]
	TcpServe(std::io::Error),
}

/// Builds the application router, with the `OpenAPI` document generated
/// from the registered routes.
pub fn app(state: AppState) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest_api_service("/docs", route::docs::routes())
		.nest("/api/v1/auth", route::auth::routes())
		.nest("/api/v1/blog", route::post::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(CompressionLayer::new())
		.layer(TraceLayer::new_for_http())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

/// The router as it is served, with trailing slashes trimmed before routing
/// so `/posts/all/` matches `/posts/all`.
pub fn service(state: AppState) -> NormalizePath<Router> {
	NormalizePathLayer::trim_trailing_slash().layer(app(state))
}

async fn database(config: &Config) -> Result<Database, store::Error> {
	Ok(if let Some(url) = &config.database_url {
		Arc::new(store::PgStore::connect(url).await?)
	} else {
		tracing::warn!("DATABASE_URL is not set, posts are kept in memory and lost on restart");

		Arc::new(store::MemoryStore::new())
	})
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
	trace::init_tracing_subscriber();

	let config = Config::from_env()?;
	let state = State::new(database(&config).await?);

	let app = service(state);

	let address = SocketAddr::new(config.host, config.port);
	let listener = tokio::net::TcpListener::bind(address)
		.await
		.map_err(InitError::TcpBind)?;

	tracing::info!("listening on {}", address);

	axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(InitError::TcpServe)
}
