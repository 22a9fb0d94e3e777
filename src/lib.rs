// Social Graph - accounts, friendships, posts, likes and the friends feed

// Runtime wiring
pub mod app_state;
pub mod config;

// Graph store implementations and external collaborator seams
pub mod infrastructure;

// Domain types
pub mod models;

// Relationship, content and feed rules
pub mod services;

// Common utilities
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use app_state::AppState;
pub use error::{AppError, AppResult};
