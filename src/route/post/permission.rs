use crate::route::auth::model::User;

use super::model::Post;

/// Whether `caller` may update or delete `post`.
///
/// Reading only requires a session, so there is no counterpart for reads.
pub fn can_write(caller: &User, post: &Post) -> bool {
	caller.id == post.author
}

#[cfg(test)]
mod test {
	use chrono::Utc;
	use uuid::Uuid;

	use super::*;
	use crate::route::post::model::PostState;

	fn user() -> User {
		User {
			id: Uuid::new_v4(),
			email: "john@smith.com".into(),
			password: Vec::new(),
			username: "john".into(),
			created_at: Utc::now(),
		}
	}

	fn post(author: &User) -> Post {
		Post {
			id: Uuid::new_v4(),
			title: "title".into(),
			content: "content".into(),
			pub_date: Utc::now(),
			state: PostState::Draft,
			author: author.id,
		}
	}

	#[test]
	fn test_owner_can_write() {
		let owner = user();

		assert!(can_write(&owner, &post(&owner)));
	}

	#[test]
	fn test_others_cannot_write() {
		let owner = user();
		let post = post(&owner);

		for _ in 0..8 {
			assert!(!can_write(&user(), &post));
		}
	}
}
