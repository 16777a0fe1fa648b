use std::fmt;
use typed_builder::TypedBuilder;

pub const DEFAULT_MIN_LENGTH: usize = 30;

/// Configures a [`HashidsSlugifier`][crate::HashidsSlugifier].
#[derive(Clone, TypedBuilder)]
pub struct SlugsSettings {
    /// Secret keying every slug; changing it invalidates all issued slugs.
    #[builder(setter(into))]
    pub salt: String,
    /// Slugs are padded up to this many characters.
    #[builder(default = DEFAULT_MIN_LENGTH)]
    pub min_length: usize,
}

// The salt is a secret and settings end up in startup logs.
impl fmt::Debug for SlugsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlugsSettings")
            .field("salt", &"<redacted>")
            .field("min_length", &self.min_length)
            .finish()
    }
}
