// Content Engine - posts, comments and like accounting

use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{BlobStorage, GraphStore};
use crate::models::{ImageUpload, LikeOutcome, NewPost, Post, PostLikes};

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn GraphStore>,
}

impl ContentService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Create a post owned by `owner`, generating an id when the draft has none.
    pub async fn create_post(&self, owner: &str, mut draft: NewPost) -> AppResult<Post> {
        if draft.id.is_none() {
            draft.id = Some(Uuid::new_v4().to_string());
        }
        let post = self.store.create_post(owner, draft).await?;
        info!("User {} created post {}", owner, post.id);
        Ok(post)
    }

    /// Upload `image` to blob storage, then create the post pointing at it.
    /// Nothing is written to the graph if the upload fails.
    pub async fn create_post_with_image(
        &self,
        owner: &str,
        mut draft: NewPost,
        image: ImageUpload,
        blobs: &dyn BlobStorage,
    ) -> AppResult<Post> {
        let id = draft
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let filename = format!("{}/{}", id, image.filename);

        let url = blobs
            .upload(&filename, image.bytes)
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Image upload failed: {}", e)))?;
        debug!("Uploaded image for post {} to {}", id, url);

        draft.image_url = Some(url);
        self.create_post(owner, draft).await
    }

    pub async fn get_posts(&self, owner: &str) -> AppResult<Vec<Post>> {
        self.store.posts_by(owner).await
    }

    pub async fn get_post(&self, post_id: &str) -> AppResult<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
    }

    /// Detach-delete a post owned by `owner`.
    ///
    /// A missing or foreign post leaves the graph untouched and reports
    /// `NotFound`; callers wanting no-op semantics can treat that as success.
    pub async fn delete_post(&self, owner: &str, post_id: &str) -> AppResult<()> {
        if !self.store.delete_post(owner, post_id).await? {
            debug!("Delete of post {} by {} matched nothing", post_id, owner);
            return Err(AppError::NotFound(format!(
                "Post {} not found for owner {}",
                post_id, owner
            )));
        }
        info!("User {} deleted post {}", owner, post_id);
        Ok(())
    }

    /// Like a post at most once per user.
    pub async fn like_post(&self, liker: &str, post_id: &str) -> AppResult<LikeOutcome> {
        let outcome = self.store.merge_like(liker, post_id).await?;
        if outcome.created {
            info!("User {} liked post {} (now {})", liker, post_id, outcome.like_count);
        } else {
            debug!("User {} already liked post {}", liker, post_id);
        }
        Ok(outcome)
    }

    /// Usernames liking the post, in like order.
    pub async fn get_likers(&self, post_id: &str) -> AppResult<Vec<String>> {
        Ok(self.like_summary(post_id).await?.likers)
    }

    /// Counter plus likers, checked against each other.
    pub async fn like_summary(&self, post_id: &str) -> AppResult<PostLikes> {
        let likes = self.store.post_likes(post_id).await?;
        if !likes.is_consistent() {
            error!(
                "Post {} like_count {} disagrees with {} likers",
                post_id,
                likes.like_count,
                likes.likers.len()
            );
            return Err(AppError::InvariantViolation(format!(
                "Post {} like_count {} does not match {} LIKED edges",
                post_id,
                likes.like_count,
                likes.likers.len()
            )));
        }
        Ok(likes)
    }

    pub async fn add_comment(&self, post_id: &str, text: &str) -> AppResult<()> {
        self.store.append_comment(post_id, text).await?;
        debug!("Comment added to post {}", post_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryGraphStore;
    use crate::models::NewUser;

    async fn setup() -> (Arc<MemoryGraphStore>, ContentService) {
        let store = Arc::new(MemoryGraphStore::new());
        for user in ["alice", "bob"] {
            store
                .create_user(NewUser::new(user, "hash", format!("{}@example.com", user)))
                .await
                .unwrap();
        }
        (store.clone(), ContentService::new(store))
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let (_, content) = setup().await;
        let a = content.create_post("alice", NewPost::new("one")).await.unwrap();
        let b = content.create_post("alice", NewPost::new("two")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.like_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_post_id_conflicts() {
        let (_, content) = setup().await;
        content
            .create_post("alice", NewPost::new("one").with_id("p1"))
            .await
            .unwrap();
        let err = content
            .create_post("bob", NewPost::new("two").with_id("p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_like_summary_detects_drift() {
        let (store, content) = setup().await;
        content
            .create_post("alice", NewPost::new("hello").with_id("p1"))
            .await
            .unwrap();
        content.like_post("bob", "p1").await.unwrap();
        store.force_like_count("p1", 7).await.unwrap();

        assert!(matches!(
            content.get_likers("p1").await,
            Err(AppError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_comments_append_in_order() {
        let (_, content) = setup().await;
        content
            .create_post(
                "alice",
                NewPost::new("hello")
                    .with_id("p1")
                    .with_comments(vec!["first".to_string()]),
            )
            .await
            .unwrap();
        content.add_comment("p1", "second").await.unwrap();

        let post = content.get_post("p1").await.unwrap();
        assert_eq!(post.comments, vec!["first", "second"]);
        assert!(matches!(
            content.add_comment("missing", "x").await,
            Err(AppError::NotFound(_))
        ));
    }
}
