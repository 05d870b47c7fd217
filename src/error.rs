use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection::{JsonRejection, PathRejection},
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{extract::Json, store};

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A stable, machine-readable error code.
	pub code: Cow<'a, str>,
	/// A human-readable description of the error.
	pub content: Cow<'a, str>,
	/// The request field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional information about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl<'a> Message<'a> {
	pub fn new(code: impl Into<Cow<'a, str>>) -> Self {
		let code = code.into();

		Self {
			content: code.clone(),
			code,
			field: None,
			details: None,
		}
	}

	pub fn content(mut self, content: impl Into<Cow<'a, str>>) -> Self {
		self.content = content.into();
		self
	}

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message<'static>>,
}

impl ErrorResponse {
	fn respond(status: StatusCode, errors: Vec<Message<'static>>) -> Response<Body> {
		(
			status,
			Json(Self {
				success: false,
				errors,
			}),
		)
			.into_response()
	}
}

/// An error that a group of routes can return, alongside the
/// application-wide [`AppError`].
///
/// The messages are presented to the client, so they should not contain
/// sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn into_errors(self) -> Vec<Message<'static>>;
}

/// Error type shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] JsonRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
}

/// A readable description of a failed validation rule.
///
/// Built from the rule's bounds only, so the rejected value is never echoed.
fn describe(field: &str, error: &validator::ValidationError) -> String {
	let min = error.params.get("min");
	let max = error.params.get("max");

	match (error.code.as_ref(), min, max) {
		("length", Some(min), Some(max)) => {
			format!("{field} must be between {min} and {max} characters")
		}
		("length", Some(min), None) => format!("{field} must be at least {min} characters"),
		("length", None, Some(max)) => format!("{field} must be at most {max} characters"),
		("email", ..) => format!("{field} must be a valid email address"),
		(code, ..) => format!("{field} is invalid ({code})"),
	}
}

impl AppError {
	fn validation_errors(errors: &validator::ValidationErrors) -> Vec<Message<'static>> {
		errors
			.field_errors()
			.into_iter()
			.flat_map(|(field, errors)| {
				let field = field.to_string();

				errors.iter().map(move |error| {
					let content = error
						.message
						.as_ref()
						.map_or_else(|| describe(&field, error), ToString::to_string);
					let mut message = Message::new(error.code.to_string())
						.content(content)
						.field(field.clone());

					// the rejected value is omitted, it can be arbitrarily large
					for (key, value) in error.params.iter().filter(|(key, _)| *key != "value") {
						message = message.detail(key.to_string(), value.clone());
					}

					message
				})
			})
			.collect()
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => ErrorResponse::respond(
				StatusCode::BAD_REQUEST,
				Self::validation_errors(&errors),
			),
			Self::Json(rejection) => ErrorResponse::respond(
				rejection.status(),
				Message::new("invalid_body")
					.content(rejection.body_text())
					.into_vec(),
			),
			Self::Path(rejection) => ErrorResponse::respond(
				rejection.status(),
				Message::new("invalid_path")
					.content(rejection.body_text())
					.into_vec(),
			),
			Self::Store(error) => {
				tracing::error!(%error, "store failure");

				ErrorResponse::respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
			}
		}
	}
}

/// The error returned from a route handler.
///
/// Either an application-wide [`AppError`] or one specific to the route group.
#[derive(Debug)]
pub enum RouteError<T> {
	App(AppError),
	Route(T),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T: ErrorShape> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T: ErrorShape> From<store::Error> for RouteError<T> {
	fn from(error: store::Error) -> Self {
		Self::App(AppError::Store(error))
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "route failure");
				} else {
					tracing::debug!(%error, "route error");
				}

				ErrorResponse::respond(status, error.into_errors())
			}
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = Self;
}
