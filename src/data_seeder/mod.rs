use tracing::debug;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::{FriendshipState, NewPost, NewUser},
};

const SAMPLE_USERS: [(&str, &str); 4] = [
    ("alice", "alice@example.com"),
    ("bob", "bob@example.com"),
    ("carol", "carol@example.com"),
    ("dave", "dave@example.com"),
];

/// (sender, recipient, accepted)
const SAMPLE_FRIENDSHIPS: [(&str, &str, bool); 3] = [
    ("alice", "bob", true),
    ("alice", "carol", true),
    ("bob", "carol", false),
];

/// (id, owner, content)
const SAMPLE_POSTS: [(&str, &str, &str); 4] = [
    ("seed-alice-1", "alice", "hello from alice"),
    ("seed-bob-1", "bob", "first post!"),
    ("seed-carol-1", "carol", "coffee time"),
    ("seed-carol-2", "carol", "back to work"),
];

/// (liker, post id)
const SAMPLE_LIKES: [(&str, &str); 4] = [
    ("bob", "seed-alice-1"),
    ("carol", "seed-alice-1"),
    ("alice", "seed-carol-1"),
    ("dave", "seed-bob-1"),
];

/// What a seeding run actually created
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub friendships: usize,
    pub posts: usize,
    pub likes: usize,
}

/// Seed a small sample graph through the services. Safe to run repeatedly:
/// anything already present is left as is.
pub async fn seed_sample_data(state: &AppState) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    for (username, email) in SAMPLE_USERS {
        match state
            .accounts
            .register(NewUser::new(username, "seeded-password-hash", email))
            .await
        {
            Ok(_) => summary.users += 1,
            Err(AppError::Conflict(_)) => debug!("Sample user {} already present", username),
            Err(e) => return Err(e),
        }
    }

    for (sender, recipient, accepted) in SAMPLE_FRIENDSHIPS {
        let existed = state.relationships.friendship_state(sender, recipient).await?
            != FriendshipState::None;
        state.relationships.send_request(sender, recipient).await?;
        if accepted {
            state.relationships.accept(sender, recipient).await?;
        }
        if !existed {
            summary.friendships += 1;
        }
    }

    for (id, owner, content) in SAMPLE_POSTS {
        match state
            .content
            .create_post(owner, NewPost::new(content).with_id(id))
            .await
        {
            Ok(_) => summary.posts += 1,
            Err(AppError::Conflict(_)) => debug!("Sample post {} already present", id),
            Err(e) => return Err(e),
        }
    }

    for (liker, post_id) in SAMPLE_LIKES {
        if state.content.like_post(liker, post_id).await?.created {
            summary.likes += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, infrastructure::MemoryGraphStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seeding_is_repeatable() {
        let state = AppState::with_store(Arc::new(MemoryGraphStore::new()), Config::in_memory());

        let first = seed_sample_data(&state).await.unwrap();
        assert_eq!(
            first,
            SeedSummary {
                users: 4,
                friendships: 3,
                posts: 4,
                likes: 4
            }
        );

        let second = seed_sample_data(&state).await.unwrap();
        assert_eq!(second, SeedSummary::default());

        let feed = state.feed.friends_feed("alice").await.unwrap();
        assert_eq!(feed.posts.len(), 3);
        assert_eq!(state.content.get_likers("seed-alice-1").await.unwrap().len(), 2);
    }
}
