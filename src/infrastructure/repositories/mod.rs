pub mod memory_repository;
pub mod postgres_repository;

pub use memory_repository::MemoryFeedStore;
pub use postgres_repository::PostgresFeedStore;
