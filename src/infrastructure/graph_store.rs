// Graph Store Adapter - the only owner of persisted social graph state
// Every method is one unit of work against the store: writes are atomic,
// reads see a single consistent snapshot.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Friendship, FriendshipMerge, LikeOutcome, NewPost, NewUser, Post, PostLikes, User};

/// Store interface for the social graph.
///
/// Schema: `User` nodes keyed by username, `Post` nodes keyed by id,
/// `POSTED` from user to post, an undirected `FRIEND{accepted}` edge per
/// unordered user pair and `LIKED{timestamp}` from user to post.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // User nodes
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn find_user(&self, username: &str) -> AppResult<Option<User>>;

    // FRIEND edges

    /// Create a pending edge for the pair unless one exists (merge on the
    /// canonical pair). Fails with `NotFound` if either user is missing.
    async fn merge_friendship(&self, sender: &str, recipient: &str) -> AppResult<FriendshipMerge>;
    /// Mark the pair's edge accepted. Fails with `NotFound` if there is no edge.
    async fn accept_friendship(&self, a: &str, b: &str) -> AppResult<Friendship>;
    /// Delete the pair's edge in any state. Returns whether an edge was removed.
    async fn delete_friendship(&self, a: &str, b: &str) -> AppResult<bool>;
    async fn find_friendship(&self, a: &str, b: &str) -> AppResult<Option<Friendship>>;
    /// Every edge touching `username`. Fails with `NotFound` for an unknown user.
    async fn friendships_of(&self, username: &str) -> AppResult<Vec<Friendship>>;

    // Post nodes and POSTED edges

    /// Create the post and its POSTED edge. `post.id` must be set.
    async fn create_post(&self, owner: &str, post: NewPost) -> AppResult<Post>;
    /// Posts owned by `owner` in insertion order. `NotFound` for an unknown user.
    async fn posts_by(&self, owner: &str) -> AppResult<Vec<Post>>;
    async fn find_post(&self, post_id: &str) -> AppResult<Option<Post>>;
    /// Detach-delete the post if `owner` owns it. Returns whether it was removed.
    async fn delete_post(&self, owner: &str, post_id: &str) -> AppResult<bool>;
    /// Append a comment. Fails with `NotFound` for an unknown post.
    async fn append_comment(&self, post_id: &str, body: &str) -> AppResult<()>;

    // LIKED edges

    /// Merge the LIKED edge and bump the counter only when the edge is new.
    async fn merge_like(&self, liker: &str, post_id: &str) -> AppResult<LikeOutcome>;
    /// Counter and likers for a post. `NotFound` for an unknown post.
    async fn post_likes(&self, post_id: &str) -> AppResult<PostLikes>;
}
