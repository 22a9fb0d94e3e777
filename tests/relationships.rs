mod common;

use common::{make_friends, memory_state, register, sqlite_state};
use social_graph::{models::FriendshipState, AppError, AppState};

async fn accepted_request_makes_mutual_friends(state: &AppState) {
    register(state, &["alice", "bob"]).await;
    make_friends(state, "alice", "bob").await;

    assert_eq!(state.relationships.list_friends("alice").await.unwrap(), vec!["bob"]);
    assert_eq!(state.relationships.list_friends("bob").await.unwrap(), vec!["alice"]);
    assert_eq!(
        state.relationships.friendship_state("alice", "bob").await.unwrap(),
        FriendshipState::Accepted
    );
}

async fn repeated_request_leaves_one_edge(state: &AppState) {
    register(state, &["alice", "bob"]).await;
    let first = state.relationships.send_request("alice", "bob").await.unwrap();
    let second = state.relationships.send_request("alice", "bob").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(state.relationships.list_connections("alice").await.unwrap(), vec!["bob"]);
    assert_eq!(state.relationships.list_pending_requests("bob").await.unwrap().len(), 1);
}

async fn removed_request_cannot_be_accepted(state: &AppState) {
    register(state, &["alice", "bob"]).await;
    state.relationships.send_request("alice", "bob").await.unwrap();
    state.relationships.remove("bob", "alice").await.unwrap();

    assert_eq!(
        state.relationships.friendship_state("alice", "bob").await.unwrap(),
        FriendshipState::None
    );
    assert!(matches!(
        state.relationships.accept("alice", "bob").await,
        Err(AppError::NotFound(_))
    ));
}

async fn unfriend_returns_pair_to_none(state: &AppState) {
    register(state, &["alice", "bob"]).await;
    make_friends(state, "alice", "bob").await;
    state.relationships.remove("alice", "bob").await.unwrap();

    assert!(state.relationships.list_friends("alice").await.unwrap().is_empty());
    assert!(state.relationships.list_connections("bob").await.unwrap().is_empty());
    assert!(matches!(
        state.relationships.remove("alice", "bob").await,
        Err(AppError::NotFound(_))
    ));
}

async fn request_to_unknown_user_is_not_found(state: &AppState) {
    register(state, &["alice"]).await;
    assert!(matches!(
        state.relationships.send_request("alice", "ghost").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        state.relationships.send_request("ghost", "alice").await,
        Err(AppError::NotFound(_))
    ));
    assert!(state.relationships.list_connections("alice").await.unwrap().is_empty());
}

async fn concurrent_requests_converge(state: &AppState) {
    register(state, &["alice", "bob"]).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let relationships = state.relationships.clone();
        let (sender, recipient) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
        handles.push(tokio::spawn(async move {
            relationships.send_request(sender, recipient).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(state.relationships.list_connections("alice").await.unwrap(), vec!["bob"]);
    let pending = state.relationships.list_pending_requests("alice").await.unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn test_accepted_request_makes_mutual_friends_memory() {
    accepted_request_makes_mutual_friends(&memory_state()).await;
}

#[tokio::test]
async fn test_accepted_request_makes_mutual_friends_sqlite() {
    let (_dir, state) = sqlite_state().await;
    accepted_request_makes_mutual_friends(&state).await;
}

#[tokio::test]
async fn test_repeated_request_leaves_one_edge_memory() {
    repeated_request_leaves_one_edge(&memory_state()).await;
}

#[tokio::test]
async fn test_repeated_request_leaves_one_edge_sqlite() {
    let (_dir, state) = sqlite_state().await;
    repeated_request_leaves_one_edge(&state).await;
}

#[tokio::test]
async fn test_removed_request_cannot_be_accepted_memory() {
    removed_request_cannot_be_accepted(&memory_state()).await;
}

#[tokio::test]
async fn test_removed_request_cannot_be_accepted_sqlite() {
    let (_dir, state) = sqlite_state().await;
    removed_request_cannot_be_accepted(&state).await;
}

#[tokio::test]
async fn test_unfriend_returns_pair_to_none_memory() {
    unfriend_returns_pair_to_none(&memory_state()).await;
}

#[tokio::test]
async fn test_unfriend_returns_pair_to_none_sqlite() {
    let (_dir, state) = sqlite_state().await;
    unfriend_returns_pair_to_none(&state).await;
}

#[tokio::test]
async fn test_request_to_unknown_user_is_not_found_memory() {
    request_to_unknown_user_is_not_found(&memory_state()).await;
}

#[tokio::test]
async fn test_request_to_unknown_user_is_not_found_sqlite() {
    let (_dir, state) = sqlite_state().await;
    request_to_unknown_user_is_not_found(&state).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_converge_memory() {
    concurrent_requests_converge(&memory_state()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_converge_sqlite() {
    let (_dir, state) = sqlite_state().await;
    concurrent_requests_converge(&state).await;
}
