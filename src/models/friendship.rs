use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order two usernames so an undirected edge has exactly one storage key.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The single undirected FRIEND edge between two users.
///
/// `user_low`/`user_high` hold the canonical ordering of the pair;
/// `requested_by` remembers which side sent the request so pending
/// requests can be split into incoming and outgoing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub user_low: String,
    pub user_high: String,
    pub requested_by: String,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Friendship {
    /// A fresh pending edge sent by `sender` to `recipient`.
    pub fn pending(sender: &str, recipient: &str, now: DateTime<Utc>) -> Self {
        let (low, high) = canonical_pair(sender, recipient);
        Self {
            user_low: low.to_string(),
            user_high: high.to_string(),
            requested_by: sender.to_string(),
            accepted: false,
            created_at: now,
            accepted_at: None,
        }
    }

    pub fn involves(&self, username: &str) -> bool {
        self.user_low == username || self.user_high == username
    }

    /// The username on the other end of the edge, if `username` is on it.
    pub fn other(&self, username: &str) -> Option<&str> {
        if self.user_low == username {
            Some(&self.user_high)
        } else if self.user_high == username {
            Some(&self.user_low)
        } else {
            None
        }
    }

    /// The side that received the request.
    pub fn addressee(&self) -> &str {
        if self.requested_by == self.user_low {
            &self.user_high
        } else {
            &self.user_low
        }
    }

    pub fn state(&self) -> FriendshipState {
        if self.accepted {
            FriendshipState::Accepted
        } else {
            FriendshipState::Pending
        }
    }
}

/// Per-pair state machine: NONE -> PENDING -> ACCEPTED, and back to NONE on remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipState {
    None,
    Pending,
    Accepted,
}

/// Result of merging a friend request onto a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendshipMerge {
    /// No edge existed; a pending one was created
    Created(Friendship),
    /// An edge already existed and was left untouched
    Existing(Friendship),
}

impl FriendshipMerge {
    pub fn friendship(&self) -> &Friendship {
        match self {
            FriendshipMerge::Created(f) | FriendshipMerge::Existing(f) => f,
        }
    }

    pub fn into_friendship(self) -> Friendship {
        match self {
            FriendshipMerge::Created(f) | FriendshipMerge::Existing(f) => f,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, FriendshipMerge::Created(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDirection {
    /// Someone else asked the user
    Incoming,
    /// The user asked someone else
    Outgoing,
}

/// A not-yet-accepted request seen from one user's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub username: String,
    pub direction: RequestDirection,
    pub requested_at: DateTime<Utc>,
}

impl PendingRequest {
    /// View `friendship` from `viewer`'s side. `None` when accepted or unrelated.
    pub fn from_friendship(viewer: &str, friendship: &Friendship) -> Option<Self> {
        if friendship.accepted {
            return None;
        }
        let other = friendship.other(viewer)?;
        let direction = if friendship.requested_by == viewer {
            RequestDirection::Outgoing
        } else {
            RequestDirection::Incoming
        };
        Some(Self {
            username: other.to_string(),
            direction,
            requested_at: friendship.created_at,
        })
    }
}
