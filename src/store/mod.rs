//! Storage port used by every route.
//!
//! Handlers never talk to a database directly, they receive a [`Store`]
//! through the router state instead. [`PgStore`] is used in production and
//! [`MemoryStore`] for local runs without a database and in tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::route::{
	auth::model::{Session, User},
	post::model::{Post, PostInput, PostSummary},
};

/// A unique constraint that a write can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
	UserEmail,
	UserUsername,
}

impl fmt::Display for Constraint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::UserEmail => "user_email_key",
			Self::UserUsername => "user_username_key",
		})
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("unique constraint {0} violated")]
	Conflict(Constraint),
	#[error("corrupt row: {0}")]
	Corrupt(String),
}

/// A user about to be registered.
///
/// The id is chosen by the caller since the password hash is salted with it.
#[derive(Debug)]
pub struct NewUser<'a> {
	pub id: Uuid,
	pub email: &'a str,
	pub username: &'a str,
	pub password: &'a [u8],
}

#[async_trait]
pub trait Store: Send + Sync {
	/// Creates a user along with their first session.
	async fn register(&self, user: NewUser<'_>) -> Result<Session, Error>;

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error>;

	/// Resolves a session token to the user that owns it.
	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>, Error>;

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error>;

	async fn create_post(&self, author: Uuid, input: &PostInput) -> Result<Post, Error>;

	/// Returns every post, newest first.
	async fn list_posts(&self) -> Result<Vec<PostSummary>, Error>;

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error>;

	/// Overwrites the writable fields of a post owned by `author` and
	/// refreshes its publish date.
	///
	/// Returns `None` if no such post exists.
	async fn update_post(
		&self,
		id: Uuid,
		author: Uuid,
		input: &PostInput,
	) -> Result<Option<Post>, Error>;

	/// Deletes a post owned by `author`, returning whether it existed.
	async fn delete_post(&self, id: Uuid, author: Uuid) -> Result<bool, Error>;
}
