// Shared fixtures for the moderation tests.

use super::moderation_models::{
    ContentObject, LanguageAware, RequestContext, SpamCheckRequest, SpamVerdict,
};
use super::spam_checker::{SiteResolver, SpamClassifier, SpamServiceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ARTICLE_TYPE: &str = "blog.article";

/// Held by tests that set the real `COMMENTS_*` / `AKISMET_*` variables.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A blog article with a publication date and an "enable comments" flag.
#[derive(Debug, Clone)]
pub struct Article {
    pub slug: String,
    pub publication_date: Option<DateTime<Utc>>,
    pub enable_comments: Option<bool>,
    pub language: Option<String>,
}

impl Article {
    pub fn published(at: DateTime<Utc>) -> Self {
        Self {
            slug: "hello-world".to_string(),
            publication_date: Some(at),
            enable_comments: Some(true),
            language: None,
        }
    }

    pub fn unpublished() -> Self {
        Self {
            slug: "draft".to_string(),
            publication_date: None,
            enable_comments: None,
            language: None,
        }
    }

    pub fn with_comments_enabled(mut self, enabled: bool) -> Self {
        self.enable_comments = Some(enabled);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }
}

impl ContentObject for Article {
    fn content_type(&self) -> &str {
        ARTICLE_TYPE
    }

    fn absolute_url(&self) -> String {
        format!("/blog/{}/", self.slug)
    }

    fn datetime_field(&self, field: &str) -> Option<DateTime<Utc>> {
        match field {
            "publication_date" => self.publication_date,
            _ => None,
        }
    }

    fn bool_field(&self, field: &str) -> Option<bool> {
        match field {
            "enable_comments" => self.enable_comments,
            _ => None,
        }
    }

    fn as_language_aware(&self) -> Option<&dyn LanguageAware> {
        self.language.as_ref().map(|_| self as &dyn LanguageAware)
    }
}

impl LanguageAware for Article {
    fn current_language(&self) -> Option<String> {
        self.language.clone()
    }
}

/// Classifier that returns a canned answer and counts calls.
#[derive(Clone)]
pub struct MockClassifier {
    response: Result<SpamVerdict, SpamServiceError>,
    pub calls: Arc<AtomicUsize>,
    pub last_request: Arc<Mutex<Option<(String, String, SpamCheckRequest, bool)>>>,
}

impl MockClassifier {
    pub fn returning(verdict: SpamVerdict) -> Self {
        Self::with_response(Ok(verdict))
    }

    pub fn failing(error: SpamServiceError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<SpamVerdict, SpamServiceError>) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpamClassifier for MockClassifier {
    async fn check(
        &self,
        credential: &str,
        blog_url: &str,
        request: &SpamCheckRequest,
        is_test: bool,
    ) -> Result<SpamVerdict, SpamServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((
            credential.to_string(),
            blog_url.to_string(),
            request.clone(),
            is_test,
        ));
        self.response.clone()
    }
}

pub struct FixedSite(pub &'static str);

impl SiteResolver for FixedSite {
    fn current_domain(&self, _context: &RequestContext) -> String {
        self.0.to_string()
    }
}
