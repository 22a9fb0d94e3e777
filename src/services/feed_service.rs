// Feed Aggregator - friends' posts, best effort per friend

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::Feed;
use crate::services::{ContentService, RelationshipService};

#[derive(Clone)]
pub struct FeedService {
    relationships: RelationshipService,
    content: ContentService,
    fanout: usize,
}

impl FeedService {
    pub fn new(relationships: RelationshipService, content: ContentService, fanout: usize) -> Self {
        Self {
            relationships,
            content,
            fanout: fanout.max(1),
        }
    }

    /// Posts of every confirmed friend of `username`.
    ///
    /// Failing to list friends fails the call. A friend whose posts cannot be
    /// fetched (`NotFound`, `StoreUnavailable`) is skipped and reported in
    /// `Feed::skipped`; any other error aborts. Friends appear in friend-list
    /// order and each friend's posts keep their store order.
    pub async fn friends_feed(&self, username: &str) -> AppResult<Feed> {
        let friends = self.relationships.list_friends(username).await?;
        debug!("Assembling feed for {} from {} friends", username, friends.len());

        let results: Vec<_> = stream::iter(friends)
            .map(|friend| async move {
                let posts = self.content.get_posts(&friend).await;
                (friend, posts)
            })
            .buffered(self.fanout)
            .collect()
            .await;

        let mut feed = Feed::default();
        for (friend, posts) in results {
            match posts {
                Ok(posts) => feed.posts.extend(posts),
                Err(e) if e.is_skippable() => {
                    warn!("Skipping posts of {} in feed for {}: {}", friend, username, e);
                    feed.skipped.push(friend);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(feed)
    }
}
