use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	Database,
};

use super::{model, permission, Error, RouteError};

/// Fetches a post and checks that the caller is allowed to modify it.
///
/// Existence is checked first, so callers that are not the author learn that
/// the post exists but cannot touch it.
async fn find_writable(
	database: &Database,
	session: &Session,
	post_id: Uuid,
) -> Result<model::Post, RouteError> {
	let post = database
		.find_post(post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	if !permission::can_write(&session.user, &post) {
		tracing::debug!(post = %post_id, user = %session.user.id, "refused write to post");

		return Err(Error::NotAuthor(post_id).into());
	}

	Ok(post)
}

/// Writes `input` to a post the caller owns.
async fn save(
	database: &Database,
	session: &Session,
	post_id: Uuid,
	input: &model::PostInput,
) -> Result<Json<model::Post>, RouteError> {
	// the post can vanish or change hands between the check and the write
	let post = database
		.update_post(post_id, session.user.id, input)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	Ok(Json(post))
}

/// Create post
/// Creates a new post authored by the authenticated user. Any author in the body is ignored.
#[route(tag = tag::POST, response(status = 201, description = "Post created.", shape = "Json<model::Post>"))]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::PostInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = database.create_post(session.user.id, &input).await?;

	tracing::info!(post = %post.id, author = %post.author, "created post");

	Ok((StatusCode::CREATED, Json(post)).into_response())
}

/// Get all posts
/// Returns a summary of every post, newest first.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<Vec<model::PostSummary>>, RouteError> {
	let posts = database.list_posts().await?;

	Ok(Json(posts))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	_session: Session,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = database
		.find_post(path.id)
		.await?
		.ok_or(Error::UnknownPost(path.id))?;

	Ok(Json(post))
}

/// Update post
/// Replaces every writable field of a post. Only the author of the post can update it.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::PostInput>,
) -> Result<Json<model::Post>, RouteError> {
	find_writable(&database, &session, path.id).await?;

	save(&database, &session, path.id, &input).await
}

/// Partially update post
/// Updates the fields present in the body, keeping the others. Only the author of the post can update it.
#[route(tag = tag::POST)]
pub async fn patch_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
	Json(patch): Json<model::PostPatch>,
) -> Result<Json<model::Post>, RouteError> {
	let post = find_writable(&database, &session, path.id).await?;
	let input = patch.merge(post.into());

	save(&database, &session, path.id, &input).await
}

/// Delete post
/// Deletes a post by its unique id. Only the author of the post can delete it.
#[route(tag = tag::POST, response(status = 204, description = "Post deleted."))]
pub async fn delete_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	find_writable(&database, &session, path.id).await?;

	if !database.delete_post(path.id, session.user.id).await? {
		return Err(Error::UnknownPost(path.id).into());
	}

	tracing::info!(post = %path.id, "deleted post");

	Ok(StatusCode::NO_CONTENT.into_response())
}
