//! In-memory graph store.
//!
//! Holds the whole graph behind one `tokio::sync::RwLock`; every write takes
//! the write lock for its full duration, which gives the same all-or-nothing
//! behaviour as a store transaction. Used by tests and by `STORE_BACKEND=memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::infrastructure::graph_store::GraphStore;
use crate::models::{
    canonical_pair, Friendship, FriendshipMerge, LikeOutcome, NewPost, NewUser, Post, PostLikes,
    User,
};

#[derive(Default)]
struct MemoryGraph {
    users: HashMap<String, User>,
    /// Keyed by canonical pair
    friendships: HashMap<(String, String), Friendship>,
    posts: HashMap<String, StoredPost>,
    /// post id -> likers in like order
    likes: HashMap<String, Vec<(String, DateTime<Utc>)>>,
    next_seq: u64,
}

struct StoredPost {
    seq: u64,
    post: Post,
}

impl MemoryGraph {
    fn require_user(&self, username: &str) -> AppResult<()> {
        if self.users.contains_key(username) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("User {} not found", username)))
        }
    }

    fn post_likes(&self, post_id: &str) -> Option<PostLikes> {
        let stored = self.posts.get(post_id)?;
        let likers = self
            .likes
            .get(post_id)
            .map(|likes| likes.iter().map(|(user, _)| user.clone()).collect())
            .unwrap_or_default();
        Some(PostLikes {
            like_count: stored.post.like_count,
            likers,
        })
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    let (low, high) = canonical_pair(a, b);
    (low.to_string(), high.to_string())
}

/// Graph store kept entirely in process memory
#[derive(Default)]
pub struct MemoryGraphStore {
    graph: RwLock<MemoryGraph>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a post's stored counter without touching its LIKED edges.
    /// Only useful for exercising drift detection.
    pub async fn force_like_count(&self, post_id: &str, like_count: u64) -> AppResult<()> {
        let mut graph = self.graph.write().await;
        let stored = graph
            .posts
            .get_mut(post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
        stored.post.like_count = like_count;
        Ok(())
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut graph = self.graph.write().await;
        if graph.users.contains_key(&user.username) {
            return Err(AppError::Conflict(format!(
                "Username {} is already taken",
                user.username
            )));
        }
        let created = User {
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            created_at: Utc::now(),
        };
        graph.users.insert(created.username.clone(), created.clone());
        Ok(created)
    }

    async fn find_user(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.graph.read().await.users.get(username).cloned())
    }

    async fn merge_friendship(&self, sender: &str, recipient: &str) -> AppResult<FriendshipMerge> {
        if sender == recipient {
            return Err(AppError::BadRequest(format!(
                "{} cannot befriend themselves",
                sender
            )));
        }
        let mut graph = self.graph.write().await;
        graph.require_user(sender)?;
        graph.require_user(recipient)?;

        let key = pair_key(sender, recipient);
        if let Some(existing) = graph.friendships.get(&key) {
            return Ok(FriendshipMerge::Existing(existing.clone()));
        }

        let friendship = Friendship::pending(sender, recipient, Utc::now());
        graph.friendships.insert(key, friendship.clone());
        Ok(FriendshipMerge::Created(friendship))
    }

    async fn accept_friendship(&self, a: &str, b: &str) -> AppResult<Friendship> {
        let mut graph = self.graph.write().await;
        let friendship = graph
            .friendships
            .get_mut(&pair_key(a, b))
            .ok_or_else(|| {
                AppError::NotFound(format!("No friend request between {} and {}", a, b))
            })?;

        if !friendship.accepted {
            friendship.accepted = true;
            friendship.accepted_at = Some(Utc::now());
        }
        Ok(friendship.clone())
    }

    async fn delete_friendship(&self, a: &str, b: &str) -> AppResult<bool> {
        let mut graph = self.graph.write().await;
        Ok(graph.friendships.remove(&pair_key(a, b)).is_some())
    }

    async fn find_friendship(&self, a: &str, b: &str) -> AppResult<Option<Friendship>> {
        Ok(self.graph.read().await.friendships.get(&pair_key(a, b)).cloned())
    }

    async fn friendships_of(&self, username: &str) -> AppResult<Vec<Friendship>> {
        let graph = self.graph.read().await;
        graph.require_user(username)?;

        let mut friendships: Vec<Friendship> = graph
            .friendships
            .values()
            .filter(|f| f.involves(username))
            .cloned()
            .collect();
        friendships.sort_by(|a, b| {
            (a.created_at, &a.user_low, &a.user_high)
                .cmp(&(b.created_at, &b.user_low, &b.user_high))
        });
        Ok(friendships)
    }

    async fn create_post(&self, owner: &str, post: NewPost) -> AppResult<Post> {
        let id = post.id.ok_or_else(|| {
            AppError::BadRequest("Post id must be assigned before storing".to_string())
        })?;

        let mut graph = self.graph.write().await;
        graph.require_user(owner)?;
        if graph.posts.contains_key(&id) {
            return Err(AppError::Conflict(format!("Post {} already exists", id)));
        }

        let created = Post {
            id: id.clone(),
            owner: owner.to_string(),
            content: post.content,
            like_count: 0,
            comments: post.comments,
            image_url: post.image_url,
            created_at: Utc::now(),
        };
        let seq = graph.next_seq;
        graph.next_seq += 1;
        graph.posts.insert(
            id,
            StoredPost {
                seq,
                post: created.clone(),
            },
        );
        Ok(created)
    }

    async fn posts_by(&self, owner: &str) -> AppResult<Vec<Post>> {
        let graph = self.graph.read().await;
        graph.require_user(owner)?;

        let mut owned: Vec<&StoredPost> = graph
            .posts
            .values()
            .filter(|stored| stored.post.owner == owner)
            .collect();
        owned.sort_by_key(|stored| stored.seq);
        Ok(owned.into_iter().map(|stored| stored.post.clone()).collect())
    }

    async fn find_post(&self, post_id: &str) -> AppResult<Option<Post>> {
        Ok(self
            .graph
            .read()
            .await
            .posts
            .get(post_id)
            .map(|stored| stored.post.clone()))
    }

    async fn delete_post(&self, owner: &str, post_id: &str) -> AppResult<bool> {
        let mut graph = self.graph.write().await;
        let owned = graph
            .posts
            .get(post_id)
            .map(|stored| stored.post.owner == owner)
            .unwrap_or(false);
        if !owned {
            return Ok(false);
        }
        graph.posts.remove(post_id);
        graph.likes.remove(post_id);
        Ok(true)
    }

    async fn append_comment(&self, post_id: &str, body: &str) -> AppResult<()> {
        let mut graph = self.graph.write().await;
        let stored = graph
            .posts
            .get_mut(post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
        stored.post.comments.push(body.to_string());
        Ok(())
    }

    async fn merge_like(&self, liker: &str, post_id: &str) -> AppResult<LikeOutcome> {
        let mut graph = self.graph.write().await;
        if !graph.posts.contains_key(post_id) {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }
        graph.require_user(liker)?;

        let current = graph
            .post_likes(post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
        if !current.is_consistent() {
            return Err(AppError::InvariantViolation(format!(
                "Post {} like_count {} does not match {} LIKED edges",
                post_id,
                current.like_count,
                current.likers.len()
            )));
        }

        if current.likers.iter().any(|user| user == liker) {
            return Ok(LikeOutcome {
                created: false,
                like_count: current.like_count,
            });
        }

        graph
            .likes
            .entry(post_id.to_string())
            .or_default()
            .push((liker.to_string(), Utc::now()));
        let stored = graph
            .posts
            .get_mut(post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
        stored.post.like_count += 1;

        Ok(LikeOutcome {
            created: true,
            like_count: stored.post.like_count,
        })
    }

    async fn post_likes(&self, post_id: &str) -> AppResult<PostLikes> {
        self.graph
            .read()
            .await
            .post_likes(post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
    }
}
