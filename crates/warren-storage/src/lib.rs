//! Storage backends for the slug registry.

pub mod memory;
pub mod redis;
pub mod traced;

pub use memory::InMemoryStore;
pub use crate::redis::RedisStore;
pub use traced::TracedStore;
