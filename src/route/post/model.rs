pub use crate::route::model::IdInput;

use chrono::{DateTime, Utc};
use macros::model;
use schemars::{
	gen::SchemaGenerator,
	schema::{InstanceType, Metadata, Schema, SchemaObject},
	JsonSchema,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// The lifecycle state of a post.
///
/// Sent and stored as its integer code: 1 (draft), 2 (published) or
/// 3 (archived). Any state can be set directly, there is no enforced ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum PostState {
	Draft,
	Published,
	Archived,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown post state {0}, expected 1 (draft), 2 (published) or 3 (archived)")]
pub struct UnknownState(pub i16);

impl PostState {
	/// The code the state is sent and stored as.
	pub fn code(self) -> i16 {
		match self {
			Self::Draft => 1,
			Self::Published => 2,
			Self::Archived => 3,
		}
	}
}

impl From<PostState> for i16 {
	fn from(state: PostState) -> Self {
		state.code()
	}
}

impl TryFrom<i16> for PostState {
	type Error = UnknownState;

	fn try_from(code: i16) -> Result<Self, Self::Error> {
		match code {
			1 => Ok(Self::Draft),
			2 => Ok(Self::Published),
			3 => Ok(Self::Archived),
			code => Err(UnknownState(code)),
		}
	}
}

impl JsonSchema for PostState {
	fn schema_name() -> String {
		"PostState".into()
	}

	fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
		SchemaObject {
			metadata: Some(Box::new(Metadata {
				description: Some("1 (draft), 2 (published) or 3 (archived)".into()),
				..Default::default()
			})),
			instance_type: Some(InstanceType::Integer.into()),
			enum_values: Some(vec![1.into(), 2.into(), 3.into()]),
			..Default::default()
		}
		.into()
	}
}

/// A single blog post, owned by the user that created it.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The title of the post.
	#[validate(length(min = 1, max = 150))]
	pub title: String,
	/// The body of the post.
	#[validate(length(min = 1, max = 1000))]
	pub content: String,
	/// The time of the last save, refreshed on every update.
	#[serde(skip_deserializing)]
	pub pub_date: DateTime<Utc>,
	/// The lifecycle state of the post.
	pub state: PostState,
	/// The user that owns the post. Always taken from the session.
	#[serde(skip_deserializing)]
	pub author: Uuid,
}

/// The projection of a post used in listings.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PostSummary {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The title of the post.
	pub title: String,
	/// The user that owns the post.
	pub author: Uuid,
	/// The lifecycle state of the post.
	pub state: PostState,
}

impl From<Post> for PostSummary {
	fn from(post: Post) -> Self {
		Self {
			id: post.id,
			title: post.title,
			author: post.author,
			state: post.state,
		}
	}
}
