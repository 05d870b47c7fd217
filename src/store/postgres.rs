use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{Constraint, Error, NewUser, Store};
use crate::route::{
	auth::model::{Session, User},
	post::model::{Post, PostInput, PostState, PostSummary},
};

/// A [`Store`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct PostRow {
	id: Uuid,
	author_id: Uuid,
	title: String,
	content: String,
	state: i16,
	pub_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PostSummaryRow {
	id: Uuid,
	author_id: Uuid,
	title: String,
	state: i16,
}

fn state(code: i16) -> Result<PostState, Error> {
	PostState::try_from(code).map_err(|error| Error::Corrupt(error.to_string()))
}

impl TryFrom<PostRow> for Post {
	type Error = Error;

	fn try_from(row: PostRow) -> Result<Self, Self::Error> {
		Ok(Self {
			id: row.id,
			title: row.title,
			content: row.content,
			pub_date: row.pub_date,
			state: state(row.state)?,
			author: row.author_id,
		})
	}
}

impl TryFrom<PostSummaryRow> for PostSummary {
	type Error = Error;

	fn try_from(row: PostSummaryRow) -> Result<Self, Self::Error> {
		Ok(Self {
			id: row.id,
			title: row.title,
			author: row.author_id,
			state: state(row.state)?,
		})
	}
}

/// Maps unique violations on the user table to [`Error::Conflict`].
fn user_conflict(error: sqlx::Error) -> Error {
	if let sqlx::Error::Database(ref database) = error {
		match database.constraint() {
			Some("user_email_key") => return Error::Conflict(Constraint::UserEmail),
			Some("user_username_key") => return Error::Conflict(Constraint::UserUsername),
			_ => {}
		}
	}

	Error::Database(error)
}

impl PgStore {
	/// Connects to the database and applies any pending migrations.
	pub async fn connect(url: &str) -> Result<Self, Error> {
		let pool = PgPoolOptions::new().connect(url).await?;

		sqlx::migrate!("./migrations").run(&pool).await?;

		Ok(Self { pool })
	}
}

#[async_trait]
impl Store for PgStore {
	async fn register(&self, user: NewUser<'_>) -> Result<Session, Error> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
				INSERT INTO "user" (id, email, username, password) VALUES ($1, $2, $3, $4)
			"#,
		)
		.bind(user.id)
		.bind(user.email)
		.bind(user.username)
		.bind(user.password)
		.execute(&mut *tx)
		.await
		.map_err(user_conflict)?;

		let session = sqlx::query_as::<_, Session>(
			r#"
				INSERT INTO session (id, user_id) VALUES ($1, $2)
				RETURNING *
			"#,
		)
		.bind(Uuid::new_v4())
		.bind(user.id)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(session)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		Ok(user)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error> {
		let session = sqlx::query_as::<_, Session>(
			"INSERT INTO session (id, user_id) VALUES ($1, $2) RETURNING *",
		)
		.bind(Uuid::new_v4())
		.bind(user_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(session)
	}

	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>, Error> {
		let user = sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(user)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn create_post(&self, author: Uuid, input: &PostInput) -> Result<Post, Error> {
		sqlx::query_as::<_, PostRow>(
			r#"
				INSERT INTO post (id, author_id, title, content, state, pub_date)
				VALUES ($1, $2, $3, $4, $5, now())
				RETURNING *
			"#,
		)
		.bind(Uuid::new_v4())
		.bind(author)
		.bind(&input.title)
		.bind(&input.content)
		.bind(input.state.code())
		.fetch_one(&self.pool)
		.await?
		.try_into()
	}

	async fn list_posts(&self) -> Result<Vec<PostSummary>, Error> {
		sqlx::query_as::<_, PostSummaryRow>(
			r#"
				SELECT id, author_id, title, state FROM post
				ORDER BY pub_date DESC
			"#,
		)
		.fetch_all(&self.pool)
		.await?
		.into_iter()
		.map(PostSummary::try_from)
		.collect()
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		sqlx::query_as::<_, PostRow>("SELECT * FROM post WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?
			.map(Post::try_from)
			.transpose()
	}

	async fn update_post(
		&self,
		id: Uuid,
		author: Uuid,
		input: &PostInput,
	) -> Result<Option<Post>, Error> {
		sqlx::query_as::<_, PostRow>(
			r#"
				UPDATE post
				SET title = $1, content = $2, state = $3, pub_date = now()
				WHERE id = $4 AND author_id = $5
				RETURNING *
			"#,
		)
		.bind(&input.title)
		.bind(&input.content)
		.bind(input.state.code())
		.bind(id)
		.bind(author)
		.fetch_optional(&self.pool)
		.await?
		.map(Post::try_from)
		.transpose()
	}

	async fn delete_post(&self, id: Uuid, author: Uuid) -> Result<bool, Error> {
		let status = sqlx::query("DELETE FROM post WHERE id = $1 AND author_id = $2")
			.bind(id)
			.bind(author)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}
}

/// These run against a live database: set `DATABASE_URL` and pass
/// `--ignored` to `cargo test`.
#[cfg(test)]
mod test {
	use super::*;

	async fn user(store: &PgStore, username: &str) -> Uuid {
		let id = Uuid::new_v4();
		let email = format!("{username}@example.com");

		store
			.register(NewUser {
				id,
				email: &email,
				username,
				password: &[0; 32],
			})
			.await
			.unwrap();

		id
	}

	fn input(title: &str, state: PostState) -> PostInput {
		PostInput {
			title: title.into(),
			content: "content".into(),
			state,
		}
	}

	#[sqlx::test]
	#[ignore = "needs DATABASE_URL"]
	async fn test_writes_are_scoped_to_the_author(pool: PgPool) {
		let store = PgStore { pool };
		let author = user(&store, "john").await;
		let stranger = user(&store, "jane").await;

		let post = store
			.create_post(author, &input("first", PostState::Draft))
			.await
			.unwrap();

		let update = input("taken", PostState::Archived);

		assert!(store
			.update_post(post.id, stranger, &update)
			.await
			.unwrap()
			.is_none());
		assert!(!store.delete_post(post.id, stranger).await.unwrap());

		let unchanged = store.find_post(post.id).await.unwrap().unwrap();

		assert_eq!(unchanged.title, "first");
		assert_eq!(unchanged.author, author);

		let updated = store
			.update_post(post.id, author, &update)
			.await
			.unwrap()
			.unwrap();

		assert_eq!(updated.title, "taken");
		assert_eq!(updated.state, PostState::Archived);
		assert!(updated.pub_date >= post.pub_date);

		assert!(store.delete_post(post.id, author).await.unwrap());
		assert!(store.find_post(post.id).await.unwrap().is_none());
	}

	#[sqlx::test]
	#[ignore = "needs DATABASE_URL"]
	async fn test_duplicate_username_is_a_conflict(pool: PgPool) {
		let store = PgStore { pool };
		user(&store, "john").await;

		let result = store
			.register(NewUser {
				id: Uuid::new_v4(),
				email: "other@example.com",
				username: "john",
				password: &[0; 32],
			})
			.await;

		assert!(matches!(
			result,
			Err(Error::Conflict(Constraint::UserUsername))
		));
	}

	#[sqlx::test]
	#[ignore = "needs DATABASE_URL"]
	async fn test_list_is_newest_first(pool: PgPool) {
		let store = PgStore { pool };
		let author = user(&store, "john").await;

		store
			.create_post(author, &input("older", PostState::Published))
			.await
			.unwrap();
		store
			.create_post(author, &input("newer", PostState::Draft))
			.await
			.unwrap();

		let posts = store.list_posts().await.unwrap();
		let titles = posts.iter().map(|post| post.title.as_str()).collect::<Vec<_>>();

		assert_eq!(titles, ["newer", "older"]);
		assert_eq!(posts[0].state, PostState::Draft);
	}
}
