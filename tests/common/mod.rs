#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

use social_graph::{
    config::{Config, DatabaseConfig, StoreBackend},
    infrastructure::{GraphStore, MemoryGraphStore},
    models::{Friendship, FriendshipMerge, LikeOutcome, NewPost, NewUser, Post, PostLikes, User},
    AppError, AppResult, AppState,
};

pub fn memory_state() -> AppState {
    AppState::with_store(Arc::new(MemoryGraphStore::new()), Config::in_memory())
}

/// File-backed SQLite state with a real multi-connection pool.
/// Keep the `TempDir` alive for as long as the state is used.
pub async fn sqlite_state() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::in_memory();
    config.store.backend = StoreBackend::Sqlite;
    config.database = DatabaseConfig {
        url: format!("sqlite:{}", dir.path().join("social.db").display()),
        max_connections: 4,
        ..DatabaseConfig::default()
    };
    let state = AppState::new(config).await.unwrap();
    (dir, state)
}

pub async fn register(state: &AppState, usernames: &[&str]) {
    for username in usernames {
        state
            .accounts
            .register(NewUser::new(
                *username,
                "hashed-password",
                format!("{}@example.com", username),
            ))
            .await
            .unwrap();
    }
}

pub async fn make_friends(state: &AppState, a: &str, b: &str) {
    state.relationships.send_request(a, b).await.unwrap();
    state.relationships.accept(a, b).await.unwrap();
}

/// Wraps a store and fails `posts_by` for chosen owners.
pub struct FlakyStore {
    inner: Arc<dyn GraphStore>,
    failing: HashSet<String>,
    fail_with: fn(&str) -> AppError,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn GraphStore>, failing: &[&str], fail_with: fn(&str) -> AppError) -> Self {
        Self {
            inner,
            failing: failing.iter().map(|s| s.to_string()).collect(),
            fail_with,
        }
    }
}

#[async_trait]
impl GraphStore for FlakyStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        self.inner.create_user(user).await
    }
    async fn find_user(&self, username: &str) -> AppResult<Option<User>> {
        self.inner.find_user(username).await
    }
    async fn merge_friendship(&self, sender: &str, recipient: &str) -> AppResult<FriendshipMerge> {
        self.inner.merge_friendship(sender, recipient).await
    }
    async fn accept_friendship(&self, a: &str, b: &str) -> AppResult<Friendship> {
        self.inner.accept_friendship(a, b).await
    }
    async fn delete_friendship(&self, a: &str, b: &str) -> AppResult<bool> {
        self.inner.delete_friendship(a, b).await
    }
    async fn find_friendship(&self, a: &str, b: &str) -> AppResult<Option<Friendship>> {
        self.inner.find_friendship(a, b).await
    }
    async fn friendships_of(&self, username: &str) -> AppResult<Vec<Friendship>> {
        self.inner.friendships_of(username).await
    }
    async fn create_post(&self, owner: &str, post: NewPost) -> AppResult<Post> {
        self.inner.create_post(owner, post).await
    }
    async fn posts_by(&self, owner: &str) -> AppResult<Vec<Post>> {
        if self.failing.contains(owner) {
            return Err((self.fail_with)(owner));
        }
        self.inner.posts_by(owner).await
    }
    async fn find_post(&self, post_id: &str) -> AppResult<Option<Post>> {
        self.inner.find_post(post_id).await
    }
    async fn delete_post(&self, owner: &str, post_id: &str) -> AppResult<bool> {
        self.inner.delete_post(owner, post_id).await
    }
    async fn append_comment(&self, post_id: &str, body: &str) -> AppResult<()> {
        self.inner.append_comment(post_id, body).await
    }
    async fn merge_like(&self, liker: &str, post_id: &str) -> AppResult<LikeOutcome> {
        self.inner.merge_like(liker, post_id).await
    }
    async fn post_likes(&self, post_id: &str) -> AppResult<PostLikes> {
        self.inner.post_likes(post_id).await
    }
}
