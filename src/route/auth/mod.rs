use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, store, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid username or password")]
	InvalidUsernameOrPassword,
	#[error("password validation error")]
	Argon(#[from] argon2::Error),
	#[error("no session cookie or bearer token")]
	NoSession,
	#[error("invalid or expired session")]
	InvalidSession,
	#[error("invalid authorization header")]
	InvalidAuthorization,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

impl Error {
	/// Converts unique violations raised while registering into their
	/// client-facing counterparts.
	pub fn from_store(error: store::Error) -> RouteError {
		match error {
			store::Error::Conflict(store::Constraint::UserEmail) => Self::EmailTaken.into(),
			store::Error::Conflict(store::Constraint::UserUsername) => Self::UsernameTaken.into(),
			error => error.into(),
		}
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword
			| Self::NoSession
			| Self::InvalidSession
			| Self::InvalidAuthorization => StatusCode::UNAUTHORIZED,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let code = match self {
			Self::InvalidUsernameOrPassword => "invalid_credentials",
			Self::Argon(..) => "internal",
			Self::NoSession => "no_session",
			Self::InvalidSession | Self::InvalidAuthorization => "invalid_session",
			Self::UsernameTaken => "username_taken",
			Self::EmailTaken => "email_taken",
		};

		let message = match &self {
			// the hashing failure is only logged
			Self::Argon(..) => error::Message::new(code),
			error => error::Message::new(code).content(error.to_string()),
		};

		match self {
			Self::UsernameTaken => message.field("username"),
			Self::EmailTaken => message.field("email"),
			_ => message,
		}
		.into_vec()
	}
}
