mod common;

use std::sync::Arc;

use common::{make_friends, memory_state, register, sqlite_state, FlakyStore};
use social_graph::{
    config::Config, infrastructure::MemoryGraphStore, models::NewPost, AppError, AppState,
};

async fn friend_sees_hello(state: &AppState) {
    register(state, &["alice", "bob"]).await;
    state.relationships.send_request("alice", "bob").await.unwrap();
    state.relationships.accept("alice", "bob").await.unwrap();
    state
        .content
        .create_post("alice", NewPost::new("hello"))
        .await
        .unwrap();

    let feed = state.feed.friends_feed("bob").await.unwrap();
    assert_eq!(feed.posts.len(), 1);
    assert_eq!(feed.posts[0].content, "hello");
    assert_eq!(feed.posts[0].like_count, 0);
    assert!(feed.skipped.is_empty());
}

async fn feed_only_includes_confirmed_friends(state: &AppState) {
    register(state, &["alice", "bob", "carol", "dave"]).await;
    make_friends(state, "alice", "bob").await;
    make_friends(state, "carol", "alice").await;
    state.relationships.send_request("dave", "alice").await.unwrap();

    for (owner, text) in [("bob", "b1"), ("bob", "b2"), ("carol", "c1"), ("dave", "d1"), ("alice", "a1")] {
        state
            .content
            .create_post(owner, NewPost::new(text))
            .await
            .unwrap();
    }

    let feed = state.feed.friends_feed("alice").await.unwrap();
    let contents: Vec<_> = feed.posts.iter().map(|p| p.content.as_str()).collect();
    // friends in sorted order, each friend's posts in store order
    assert_eq!(contents, vec!["b1", "b2", "c1"]);
}

#[tokio::test]
async fn test_friend_sees_hello_memory() {
    friend_sees_hello(&memory_state()).await;
}

#[tokio::test]
async fn test_friend_sees_hello_sqlite() {
    let (_dir, state) = sqlite_state().await;
    friend_sees_hello(&state).await;
}

#[tokio::test]
async fn test_feed_only_includes_confirmed_friends_memory() {
    feed_only_includes_confirmed_friends(&memory_state()).await;
}

#[tokio::test]
async fn test_feed_only_includes_confirmed_friends_sqlite() {
    let (_dir, state) = sqlite_state().await;
    feed_only_includes_confirmed_friends(&state).await;
}

#[tokio::test]
async fn test_feed_of_unknown_user_fails() {
    let state = memory_state();
    assert!(matches!(
        state.feed.friends_feed("ghost").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_failing_friend_is_skipped() {
    let inner = Arc::new(MemoryGraphStore::new());
    let store = FlakyStore::new(inner, &["bob"], |owner: &str| {
        AppError::StoreUnavailable(format!("connection reset while reading {}", owner))
    });
    let state = AppState::with_store(Arc::new(store), Config::in_memory());

    register(&state, &["alice", "bob", "carol"]).await;
    make_friends(&state, "alice", "bob").await;
    make_friends(&state, "alice", "carol").await;
    state
        .content
        .create_post("carol", NewPost::new("still here"))
        .await
        .unwrap();

    let feed = state.feed.friends_feed("alice").await.unwrap();
    assert_eq!(feed.skipped, vec!["bob"]);
    assert_eq!(feed.posts.len(), 1);
    assert_eq!(feed.posts[0].content, "still here");
}

#[tokio::test]
async fn test_missing_friend_is_skipped() {
    let inner = Arc::new(MemoryGraphStore::new());
    let store = FlakyStore::new(inner, &["carol"], |owner: &str| {
        AppError::NotFound(format!("User {} not found", owner))
    });
    let state = AppState::with_store(Arc::new(store), Config::in_memory());

    register(&state, &["alice", "bob", "carol"]).await;
    make_friends(&state, "alice", "bob").await;
    make_friends(&state, "alice", "carol").await;
    state
        .content
        .create_post("bob", NewPost::new("from bob"))
        .await
        .unwrap();

    let feed = state.feed.friends_feed("alice").await.unwrap();
    assert_eq!(feed.skipped, vec!["carol"]);
    assert_eq!(feed.posts[0].content, "from bob");
}

#[tokio::test]
async fn test_invariant_violation_aborts_feed() {
    let inner = Arc::new(MemoryGraphStore::new());
    let store = FlakyStore::new(inner, &["bob"], |owner: &str| {
        AppError::InvariantViolation(format!("corrupt post row for {}", owner))
    });
    let state = AppState::with_store(Arc::new(store), Config::in_memory());

    register(&state, &["alice", "bob", "carol"]).await;
    make_friends(&state, "alice", "bob").await;
    make_friends(&state, "alice", "carol").await;

    assert!(matches!(
        state.feed.friends_feed("alice").await,
        Err(AppError::InvariantViolation(_))
    ));
}
