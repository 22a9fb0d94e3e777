// Infrastructure - graph store implementations and external collaborator seams
pub mod blob_storage;   // Image hosting interface
pub mod graph_store;    // Store interface
pub mod memory_store;   // In-process store
pub mod sqlite_store;   // sqlx SQLite store
pub mod viewer;         // Authenticated request viewer

pub use blob_storage::BlobStorage;
pub use graph_store::GraphStore;
pub use memory_store::MemoryGraphStore;
pub use sqlite_store::SqliteGraphStore;
pub use viewer::Viewer;
