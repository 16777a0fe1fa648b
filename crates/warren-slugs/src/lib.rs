//! Slug encoding and the per-instance slug registry.
//!
//! A [`Slugifier`] turns an `(instance_index, sequence)` pair into a short
//! slug and back. A [`SlugRegistry`] owns one instance index and a local
//! sequence counter, and persists URLs under the matching
//! [`CompositeKey`][warren_core::CompositeKey] through an injected
//! [`KeyValueStore`][warren_core::KeyValueStore].

pub mod error;
pub mod registry;
pub mod settings;
pub mod slugifier;

pub use error::{RegistryError, SlugError};
pub use registry::{SlugRegistry, UrlRegistry};
pub use settings::{SlugsSettings, DEFAULT_MIN_LENGTH};
pub use slugifier::{HashidsSlugifier, Slugifier};
