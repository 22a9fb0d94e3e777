use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PostId = String;

/// A post as read back from the store, owned through the POSTED relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub owner: String,
    pub content: String,
    pub like_count: u64,
    pub comments: Vec<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a post. When `id` is `None` a UUID is generated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub id: Option<PostId>,
    pub content: String,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
}

impl NewPost {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<PostId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Raw image bytes handed to blob storage before the post is created.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Result of a like: whether a new LIKED edge was created and the count after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub created: bool,
    pub like_count: u64,
}

/// The stored counter and the LIKED edges, read in one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLikes {
    pub like_count: u64,
    pub likers: Vec<String>,
}

impl PostLikes {
    pub fn is_consistent(&self) -> bool {
        self.like_count == self.likers.len() as u64
    }
}

/// Friends' posts plus the friends whose posts could not be fetched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub posts: Vec<Post>,
    pub skipped: Vec<String>,
}
