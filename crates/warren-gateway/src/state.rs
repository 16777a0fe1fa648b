use std::sync::Arc;

use warren_slugs::UrlRegistry;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<dyn UrlRegistry>,
    slug_min_length: usize,
    public_base_url: Option<String>,
}

impl AppState {
    pub fn new(registry: Arc<dyn UrlRegistry>, slug_min_length: usize) -> Self {
        Self {
            registry,
            slug_min_length,
            public_base_url: None,
        }
    }

    /// Makes create responses carry a full `short_url` next to the slug.
    pub fn with_public_base_url(mut self, public_base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(public_base_url.into());
        self
    }

    pub fn registry(&self) -> &dyn UrlRegistry {
        self.registry.as_ref()
    }

    /// Slugs shorter than this can never have been produced by the registry.
    pub fn slug_min_length(&self) -> usize {
        self.slug_min_length
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url.as_deref()
    }
}
