use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	session,
	store::NewUser,
	AppState, Database,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and creating a new password,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Checks `password` against the stored hash of `user`.
///
/// The hash is computed even when there is no such user, so an unknown email
/// takes as long to reject as a wrong password.
fn verify_password(
	hasher: &Argon2,
	password: &str,
	user: Option<&model::User>,
) -> Result<bool, argon2::Error> {
	let salt = user.map_or_else(Uuid::nil, |user| user.id);
	let hashed = hash_password(hasher, password, &salt)?;

	Ok(user.is_some_and(|user| user.password == hashed))
}

/// Log in
/// Logs in to an account, returning an associated session token and cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::Session>"))]
pub async fn login(
	State(state): State<AppState>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user = state.database.find_user_by_email(&auth.email).await?;
	let verified =
		verify_password(&state.hasher, &auth.password, user.as_ref()).map_err(Error::Argon)?;

	let Some(user) = user.filter(|_| verified) else {
		tracing::debug!("rejected login attempt");

		return Err(Error::InvalidUsernameOrPassword.into());
	};

	let session = state.database.create_session(user.id).await?;
	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)).into_response())
}

/// Log out
/// Logs out of the authenticated account, invalidating its session.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(database): State<Database>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	database.delete_session(session.id).await?;

	// Clear the session cookie
	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	)
		.into_response())
}

/// Register account
/// Registers a new account, returning an associated session token and cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Registered successfully.", shape = "Json<model::Session>"))]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &auth.password, &user_id).map_err(Error::Argon)?;

	let session = state
		.database
		.register(NewUser {
			id: user_id,
			email: &auth.email,
			username: &auth.username,
			password: &hashed,
		})
		.await
		.map_err(Error::from_store)?;

	tracing::info!(user = %user_id, username = %auth.username, "registered user");

	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)).into_response())
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}
