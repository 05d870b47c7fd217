use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Constraint, Error, NewUser, Store};
use crate::route::{
	auth::model::{Session, User},
	post::model::{Post, PostInput, PostSummary},
};

#[derive(Default)]
struct Tables {
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Session>,
	posts: HashMap<Uuid, Post>,
}

/// A [`Store`] that keeps everything in process memory.
///
/// Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

fn new_session(user_id: Uuid) -> Session {
	Session {
		id: Uuid::new_v4(),
		user_id,
		created_at: Utc::now(),
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn register(&self, user: NewUser<'_>) -> Result<Session, Error> {
		let mut tables = self.tables.write().await;

		for existing in tables.users.values() {
			if existing.email == user.email {
				return Err(Error::Conflict(Constraint::UserEmail));
			}

			if existing.username == user.username {
				return Err(Error::Conflict(Constraint::UserUsername));
			}
		}

		tables.users.insert(
			user.id,
			User {
				id: user.id,
				email: user.email.to_owned(),
				password: user.password.to_vec(),
				username: user.username.to_owned(),
				created_at: Utc::now(),
			},
		);

		let session = new_session(user.id);
		tables.sessions.insert(session.id, session.clone());

		Ok(session)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.users
			.values()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error> {
		let mut tables = self.tables.write().await;
		let session = new_session(user_id);

		tables.sessions.insert(session.id, session.clone());

		Ok(session)
	}

	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.sessions
			.get(&session_id)
			.and_then(|session| tables.users.get(&session.user_id))
			.cloned())
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error> {
		self.tables.write().await.sessions.remove(&session_id);

		Ok(())
	}

	async fn create_post(&self, author: Uuid, input: &PostInput) -> Result<Post, Error> {
		let post = Post {
			id: Uuid::new_v4(),
			title: input.title.clone(),
			content: input.content.clone(),
			pub_date: Utc::now(),
			state: input.state,
			author,
		};

		self.tables
			.write()
			.await
			.posts
			.insert(post.id, post.clone());

		Ok(post)
	}

	async fn list_posts(&self) -> Result<Vec<PostSummary>, Error> {
		let tables = self.tables.read().await;
		let mut posts = tables.posts.values().collect::<Vec<_>>();

		posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

		Ok(posts
			.into_iter()
			.cloned()
			.map(PostSummary::from)
			.collect())
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		Ok(self.tables.read().await.posts.get(&id).cloned())
	}

	async fn update_post(
		&self,
		id: Uuid,
		author: Uuid,
		input: &PostInput,
	) -> Result<Option<Post>, Error> {
		let mut tables = self.tables.write().await;

		let Some(post) = tables
			.posts
			.get_mut(&id)
			.filter(|post| post.author == author)
		else {
			return Ok(None);
		};

		post.title.clone_from(&input.title);
		post.content.clone_from(&input.content);
		post.state = input.state;
		post.pub_date = Utc::now();

		Ok(Some(post.clone()))
	}

	async fn delete_post(&self, id: Uuid, author: Uuid) -> Result<bool, Error> {
		let mut tables = self.tables.write().await;

		if !tables.posts.get(&id).is_some_and(|post| post.author == author) {
			return Ok(false);
		}

		Ok(tables.posts.remove(&id).is_some())
	}
}
