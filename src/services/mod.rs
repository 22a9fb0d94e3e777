// Services - business rules on top of the graph store

pub mod account_service;
pub mod content_service;
pub mod feed_service;
pub mod relationship_service;

pub use account_service::AccountService;
pub use content_service::ContentService;
pub use feed_service::FeedService;
pub use relationship_service::RelationshipService;
