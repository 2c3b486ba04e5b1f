// Spam classifier adapter - asks a remote service about a comment, at most once
// per comment per evaluation.
//
// The adapter only produces a verdict. Turning a verdict into "reject" or "hold"
// depends on the configured action and happens in the moderation service.

use super::env_config::{env_flag, env_string};
use super::moderation_models::{
    Comment, ContentObject, RequestContext, SpamCheckRequest, SpamVerdict,
};
use super::moderation_service::ModerationError;
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Failure talking to the spam classification service.
///
/// Client implementations translate their transport errors into this type so
/// nothing outside the infra layer depends on the HTTP client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpamServiceError {
    #[error("Spam service rejected the API key")]
    InvalidCredential,

    #[error("Spam service unreachable: {0}")]
    Transport(String),

    #[error("Unexpected spam service response: {0}")]
    MalformedResponse(String),

    #[error("Spam service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

// ============================================================================
// PORTS
// ============================================================================

/// Remote spam classification service.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    /// Classify one comment. `is_test` is passed through so the service doesn't
    /// learn from test traffic.
    async fn check(
        &self,
        credential: &str,
        blog_url: &str,
        request: &SpamCheckRequest,
        is_test: bool,
    ) -> Result<SpamVerdict, SpamServiceError>;
}

// Lets the service hold a runtime-selected classifier.
#[async_trait]
impl SpamClassifier for Box<dyn SpamClassifier> {
    async fn check(
        &self,
        credential: &str,
        blog_url: &str,
        request: &SpamCheckRequest,
        is_test: bool,
    ) -> Result<SpamVerdict, SpamServiceError> {
        (**self).check(credential, blog_url, request, is_test).await
    }
}

/// Resolves the domain of the site a request was made to.
pub trait SiteResolver: Send + Sync {
    fn current_domain(&self, context: &RequestContext) -> String;
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SpamSettings {
    /// Credential for the spam service; required once spam checks run
    pub api_key: Option<String>,
    /// Overrides the blog URL derived from the request
    pub blog_url: Option<String>,
    /// Mark requests as test traffic
    pub is_test: bool,
    /// Treat service failures as an `unknown` verdict instead of an error
    pub fail_open: bool,
}

impl SpamSettings {
    /// Read `AKISMET_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: env_string("AKISMET_API_KEY"),
            blog_url: env_string("AKISMET_BLOG_URL"),
            is_test: env_flag("AKISMET_IS_TEST"),
            fail_open: env_flag("AKISMET_FAIL_OPEN"),
        }
    }
}

// ============================================================================
// ADAPTER
// ============================================================================

/// Memoizing front for a `SpamClassifier`.
pub struct SpamChecker<C: SpamClassifier> {
    classifier: C,
    site: Box<dyn SiteResolver>,
    settings: SpamSettings,
}

impl<C: SpamClassifier> SpamChecker<C> {
    pub fn new(classifier: C, site: Box<dyn SiteResolver>, settings: SpamSettings) -> Self {
        Self {
            classifier,
            site,
            settings,
        }
    }

    /// Get the verdict for `comment`, calling the service only if this comment
    /// hasn't been checked yet.
    pub async fn check(
        &self,
        comment: &mut Comment,
        target: &dyn ContentObject,
        context: &RequestContext,
    ) -> Result<SpamVerdict, ModerationError> {
        if let Some(verdict) = comment.cached_verdict() {
            tracing::debug!(%verdict, "Using cached spam verdict");
            return Ok(verdict);
        }

        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            ModerationError::Configuration(
                "AKISMET_API_KEY must be set to use comment moderation with Akismet".to_string(),
            )
        })?;

        let blog_url = self.blog_url(context);
        let request = build_request(&blog_url, comment, target, context);

        let verdict = match self
            .classifier
            .check(api_key, &blog_url, &request, self.settings.is_test)
            .await
        {
            Ok(verdict) => verdict,
            Err(e) if self.settings.fail_open => {
                tracing::warn!(
                    content_type = target.content_type(),
                    "Spam check failed, treating verdict as unknown: {}",
                    e
                );
                SpamVerdict::Unknown
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            content_type = target.content_type(),
            %verdict,
            "Spam classifier verdict"
        );
        comment.cache_verdict(verdict);
        Ok(verdict)
    }

    /// The configured blog URL, or `scheme://domain/` for the current request.
    fn blog_url(&self, context: &RequestContext) -> String {
        if let Some(url) = &self.settings.blog_url {
            return url.clone();
        }

        let scheme = if context.is_secure { "https" } else { "http" };
        format!("{}://{}/", scheme, self.site.current_domain(context))
    }
}

/// Build the classifier payload for one comment.
pub fn build_request(
    blog_url: &str,
    comment: &Comment,
    target: &dyn ContentObject,
    context: &RequestContext,
) -> SpamCheckRequest {
    let is_admin = context.user.as_ref().is_some_and(|u| u.is_superuser);

    SpamCheckRequest {
        permalink: join_url(blog_url, &target.absolute_url()),
        comment_type: "comment",
        comment_author: comment.name.clone().unwrap_or_default(),
        comment_author_email: comment.email.clone().unwrap_or_default(),
        comment_author_url: comment.url.clone().unwrap_or_default(),
        comment_content: comment.body.clone(),
        comment_date: comment.submit_date,
        referrer: context.referrer.clone().unwrap_or_default(),
        user_agent: context.user_agent.clone().unwrap_or_default(),
        user_ip: comment.ip_address.clone().unwrap_or_default(),
        user_role: is_admin.then_some("administrator"),
        blog_lang: target
            .as_language_aware()
            .and_then(|lang| lang.language_hint()),
    }
}

/// Resolve `path` against `base` the way a browser resolves a link.
fn join_url(base: &str, path: &str) -> String {
    url::Url::parse(base)
        .and_then(|b| b.join(path))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{}", base, path))
}
