use crate::core::moderation::{RequestContext, SiteResolver};

/// Site with a single, configured domain.
#[derive(Debug, Clone)]
pub struct ConfiguredSite {
    domain: String,
}

impl ConfiguredSite {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Read `SITE_DOMAIN`, defaulting to `localhost`.
    pub fn from_env() -> Self {
        let domain = std::env::var("SITE_DOMAIN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        Self::new(domain)
    }
}

impl SiteResolver for ConfiguredSite {
    fn current_domain(&self, _context: &RequestContext) -> String {
        self.domain.clone()
    }
}
