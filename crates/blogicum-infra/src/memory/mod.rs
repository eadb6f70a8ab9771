//! In-memory storage - used when no database is configured, and in tests.
//!
//! Data is lost on process restart.

mod repos;
mod store;

pub use repos::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryLocationRepository,
    InMemoryPageRepository, InMemoryPostRepository, InMemoryUserRepository,
};
pub use store::InMemoryStore;
