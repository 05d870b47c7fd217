use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use uuid::Uuid;

use crate::{
	error::RouteError,
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_SESSION},
	route::auth,
	session, Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Extracts the session and related user from the request.
///
/// The session token is read from the `Authorization: Bearer` header if
/// present, otherwise from the session cookie.
///
/// If neither exists, a [`auth::Error::NoSession`] is returned.
/// If the authorization header is malformed, an [`auth::Error::InvalidAuthorization`]
/// is returned, and if the token is unknown, an [`auth::Error::InvalidSession`].
///
/// ```rust,ignore
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

/// Reads the session token from the request headers.
fn session_token(parts: &request::Parts) -> Result<Uuid, auth::Error> {
	if let Some(authorization) = parts.headers.get(header::AUTHORIZATION) {
		let token = authorization
			.to_str()
			.ok()
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.ok_or(auth::Error::InvalidAuthorization)?;

		return Uuid::parse_str(token.trim()).map_err(|_| auth::Error::InvalidAuthorization);
	}

	let cookie = parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.ok_or(auth::Error::NoSession)?;

	Uuid::parse_str(cookie.value()).map_err(|_| auth::Error::InvalidSession)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	/// Extracts the session from the request using a bearer token or session cookie.
	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let id = session_token(parts)?;

		let database = Database::from_ref(state);
		let user = database
			.find_session_user(id)
			.await?
			.ok_or(auth::Error::InvalidSession)?;

		Ok(Session { id, user })
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie or bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}
