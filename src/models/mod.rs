// Domain models for the social graph: users, friendships, posts and likes

pub mod friendship;
pub mod post;
pub mod user;

pub use friendship::{
    canonical_pair, Friendship, FriendshipMerge, FriendshipState, PendingRequest, RequestDirection,
};
pub use post::{Feed, ImageUpload, LikeOutcome, NewPost, Post, PostId, PostLikes};
pub use user::{NewUser, User};
