// Relationship Engine - friendship state machine over the FRIEND edge
//
// Per unordered pair: NONE -> PENDING (send_request) -> ACCEPTED (accept),
// and PENDING | ACCEPTED -> NONE (remove). Reject and unfriend are the same
// remove operation.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::GraphStore;
use crate::models::{Friendship, FriendshipState, PendingRequest};

#[derive(Clone)]
pub struct RelationshipService {
    store: Arc<dyn GraphStore>,
}

impl RelationshipService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Send a friend request, merging onto any edge the pair already has.
    ///
    /// An existing edge (pending in either direction, or accepted) is
    /// returned unchanged.
    pub async fn send_request(&self, sender: &str, recipient: &str) -> AppResult<Friendship> {
        if sender == recipient {
            return Err(AppError::BadRequest(format!(
                "{} cannot send a friend request to themselves",
                sender
            )));
        }

        let merge = self.store.merge_friendship(sender, recipient).await?;
        if merge.was_created() {
            info!("Friend request {} -> {} created", sender, recipient);
        } else {
            debug!(
                "Friend request {} -> {} merged onto existing {:?} edge",
                sender,
                recipient,
                merge.friendship().state()
            );
        }
        Ok(merge.into_friendship())
    }

    /// Accept the pair's request. Idempotent once accepted.
    pub async fn accept(&self, sender: &str, recipient: &str) -> AppResult<Friendship> {
        let friendship = self.store.accept_friendship(sender, recipient).await?;
        info!("Friendship {} <-> {} accepted", sender, recipient);
        Ok(friendship)
    }

    /// Remove the pair's edge whatever its state.
    pub async fn remove(&self, sender: &str, recipient: &str) -> AppResult<()> {
        if !self.store.delete_friendship(sender, recipient).await? {
            return Err(AppError::NotFound(format!(
                "No friendship between {} and {}",
                sender, recipient
            )));
        }
        info!("Friendship {} <-> {} removed", sender, recipient);
        Ok(())
    }

    /// Confirmed friends only.
    pub async fn list_friends(&self, username: &str) -> AppResult<Vec<String>> {
        let friendships = self.store.friendships_of(username).await?;
        Ok(others(username, friendships.iter().filter(|f| f.accepted)))
    }

    /// Everyone sharing an edge with `username`, pending or accepted.
    pub async fn list_connections(&self, username: &str) -> AppResult<Vec<String>> {
        let friendships = self.store.friendships_of(username).await?;
        Ok(others(username, friendships.iter()))
    }

    /// Pending requests touching `username`, oldest first.
    pub async fn list_pending_requests(&self, username: &str) -> AppResult<Vec<PendingRequest>> {
        let friendships = self.store.friendships_of(username).await?;
        Ok(friendships
            .iter()
            .filter_map(|f| PendingRequest::from_friendship(username, f))
            .collect())
    }

    pub async fn friendship_state(&self, a: &str, b: &str) -> AppResult<FriendshipState> {
        Ok(self
            .store
            .find_friendship(a, b)
            .await?
            .map(|f| f.state())
            .unwrap_or(FriendshipState::None))
    }
}

/// Other side of each edge, sorted and deduplicated.
fn others<'a>(username: &str, friendships: impl Iterator<Item = &'a Friendship>) -> Vec<String> {
    friendships
        .filter_map(|f| f.other(username))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
