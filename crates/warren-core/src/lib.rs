//! Core types and traits for the Warren URL shortener.
//!
//! This crate provides the domain types shared by the slug registry, the
//! storage backends and the HTTP gateway, plus the two capabilities the
//! registry consumes: a key/value store and an instance index source.

pub mod error;
pub mod key;
pub mod slug;
pub mod store;

pub use error::{CoreError, StorageError};
pub use key::CompositeKey;
pub use slug::Slug;
pub use store::{InstanceIndexSource, KeyValueStore};
