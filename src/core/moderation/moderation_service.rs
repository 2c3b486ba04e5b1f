// Moderation service - decides what happens to a submitted comment.
//
// Two questions, asked in order:
// - allow:    may the comment be posted at all? (false = reject outright)
// - moderate: should an allowed comment wait for review? (true = hold)
//
// NO HTTP or storage dependencies here - the spam service, the site and the
// content object all come in through traits.

use super::moderation_models::{
    Comment, ContentObject, ModerationDecision, PolicyConfig, RequestContext, SpamAction,
    SpamVerdict,
};
use super::policy_registry::PolicyRegistry;
use super::spam_checker::{SpamChecker, SpamClassifier, SpamServiceError};
use super::time_window::TimeWindow;
use super::word_matcher::contains_denied_word;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    SpamService(#[from] SpamServiceError),
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Applies the registered policy of a comment's target to the comment.
pub struct ModerationService<C: SpamClassifier> {
    registry: Arc<PolicyRegistry>,
    spam: SpamChecker<C>,
}

impl<C: SpamClassifier> ModerationService<C> {
    pub fn new(registry: Arc<PolicyRegistry>, spam: SpamChecker<C>) -> Self {
        Self { registry, spam }
    }

    /// Run `allow` and, only if it passes, `moderate`.
    pub async fn evaluate(
        &self,
        comment: &mut Comment,
        target: &dyn ContentObject,
        context: &RequestContext,
    ) -> Result<ModerationDecision, ModerationError> {
        if !self.allow(comment, target, context).await? {
            return Ok(ModerationDecision::rejected());
        }

        let moderated = self.moderate(comment, target, context).await?;
        Ok(ModerationDecision {
            allowed: true,
            moderated,
            removed: comment.is_removed,
        })
    }

    /// May `comment` be posted on `target`?
    ///
    /// Returns `false` when the comment window is closed, or when the spam
    /// classifier flags the comment and the configured action discards it.
    pub async fn allow(
        &self,
        comment: &mut Comment,
        target: &dyn ContentObject,
        context: &RequestContext,
    ) -> Result<bool, ModerationError> {
        let Some(policy) = self.registry.lookup(target.content_type()) else {
            return Ok(true);
        };

        if !TimeWindow::new(policy).is_open(target, Utc::now()) {
            tracing::info!(
                content_type = target.content_type(),
                "Comment rejected: comments are closed"
            );
            return Ok(false);
        }

        if policy.spam_check_enabled {
            let verdict = self.spam.check(comment, target, context).await?;
            let discard = match policy.spam_action {
                SpamAction::Delete => verdict.is_spam(),
                SpamAction::Auto => verdict == SpamVerdict::DefiniteSpam,
                SpamAction::Moderate | SpamAction::SoftDelete => false,
            };

            if discard {
                tracing::info!(
                    content_type = target.content_type(),
                    %verdict,
                    action = %policy.spam_action,
                    "Comment rejected as spam"
                );
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Should an allowed `comment` be held for review instead of published?
    ///
    /// Spam is checked first so flagged comments get the removed marker before
    /// any other rule can end the evaluation.
    pub async fn moderate(
        &self,
        comment: &mut Comment,
        target: &dyn ContentObject,
        context: &RequestContext,
    ) -> Result<bool, ModerationError> {
        let Some(policy) = self.registry.lookup(target.content_type()) else {
            return Ok(false);
        };

        if policy.spam_check_enabled {
            let verdict = self.spam.check(comment, target, context).await?;
            if verdict.is_flagged() {
                // `delete` spam only gets here when `allow` was skipped or the
                // classifier degraded between calls
                if verdict.is_spam() && marks_removed(policy.spam_action) {
                    comment.is_removed = true;
                }

                tracing::info!(
                    content_type = target.content_type(),
                    %verdict,
                    action = %policy.spam_action,
                    removed = comment.is_removed,
                    "Comment held: flagged by spam classifier"
                );
                return Ok(true);
            }
        }

        if TimeWindow::new(policy).past_moderate_after(target, Utc::now()) {
            tracing::info!(
                content_type = target.content_type(),
                "Comment held: past moderate-after date"
            );
            return Ok(true);
        }

        if contains_denied_word(&policy.denylist, &comment.body) {
            tracing::info!(
                content_type = target.content_type(),
                "Comment held: contains a denied word"
            );
            return Ok(true);
        }

        if self.recheck_spam(policy) {
            let verdict = self.spam.check(comment, target, context).await?;
            if verdict.is_flagged() {
                return Ok(true);
            }
        }

        tracing::debug!(
            content_type = target.content_type(),
            "Comment published without moderation"
        );
        Ok(false)
    }

    /// Only `moderate`-mode spam is worth a second look after the other rules.
    /// The verdict is cached, so this never reaches the service twice.
    fn recheck_spam(&self, policy: &PolicyConfig) -> bool {
        policy.spam_check_enabled
            && !matches!(policy.spam_action, SpamAction::SoftDelete | SpamAction::Delete)
    }

    pub fn comments_are_open(&self, target: &dyn ContentObject) -> bool {
        self.registry.comments_are_open(target)
    }

    pub fn comments_are_moderated(&self, target: &dyn ContentObject) -> bool {
        self.registry.comments_are_moderated(target)
    }
}

fn marks_removed(action: SpamAction) -> bool {
    matches!(
        action,
        SpamAction::Auto | SpamAction::SoftDelete | SpamAction::Delete
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::spam_checker::SpamSettings;
    use crate::core::moderation::test_support::{Article, FixedSite, MockClassifier, ARTICLE_TYPE};
    use chrono::Duration;

    fn dated(config: PolicyConfig) -> PolicyConfig {
        PolicyConfig {
            publication_date_field: Some("publication_date".to_string()),
            enable_comments_field: Some("enable_comments".to_string()),
            ..config
        }
    }

    fn spam_policy(action: SpamAction) -> PolicyConfig {
        dated(PolicyConfig {
            spam_check_enabled: true,
            spam_action: action,
            ..Default::default()
        })
    }

    fn service_with_key(
        config: PolicyConfig,
        classifier: MockClassifier,
        api_key: Option<&str>,
    ) -> ModerationService<MockClassifier> {
        let mut registry = PolicyRegistry::default();
        registry.register(ARTICLE_TYPE, config);

        let settings = SpamSettings {
            api_key: api_key.map(str::to_string),
            ..Default::default()
        };
        let spam = SpamChecker::new(classifier, Box::new(FixedSite("example.com")), settings);
        ModerationService::new(Arc::new(registry), spam)
    }

    fn service(config: PolicyConfig, classifier: MockClassifier) -> ModerationService<MockClassifier> {
        service_with_key(config, classifier, Some("secret"))
    }

    fn comment(body: &str) -> Comment {
        Comment::new(body, Utc::now())
    }

    fn fresh_article() -> Article {
        Article::published(Utc::now() - Duration::days(1))
    }

    #[tokio::test]
    async fn test_closed_window_rejects() {
        let classifier = MockClassifier::returning(SpamVerdict::None);
        let service = service(
            dated(PolicyConfig {
                close_after_days: Some(30),
                ..Default::default()
            }),
            classifier.clone(),
        );
        let article = Article::published(Utc::now() - Duration::days(40));

        let allowed = service
            .allow(&mut comment("hi"), &article, &RequestContext::default())
            .await
            .unwrap();

        assert!(!allowed);
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_window_rejects_even_with_spam_and_denylist_config() {
        let classifier = MockClassifier::returning(SpamVerdict::None);
        let mut config = spam_policy(SpamAction::Moderate).with_denylist(["casino"]);
        config.close_after_days = Some(30);
        let service = service(config, classifier.clone());
        let article = Article::published(Utc::now() - Duration::days(40));

        let decision = service
            .evaluate(&mut comment("casino"), &article, &RequestContext::default())
            .await
            .unwrap();

        assert_eq!(decision, ModerationDecision::rejected());
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_comments_reject() {
        let service = service(
            dated(PolicyConfig::default()),
            MockClassifier::returning(SpamVerdict::None),
        );
        let article = fresh_article().with_comments_enabled(false);

        let allowed = service
            .allow(&mut comment("hi"), &article, &RequestContext::default())
            .await
            .unwrap();

        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_moderate_after_holds_clean_comment() {
        let classifier = MockClassifier::returning(SpamVerdict::None);
        let mut config = spam_policy(SpamAction::SoftDelete);
        config.moderate_after_days = Some(7);
        let service = service(config, classifier.clone());
        let article = Article::published(Utc::now() - Duration::days(10));
        let mut comment = comment("Nice article");
        let context = RequestContext::default();

        assert!(service.allow(&mut comment, &article, &context).await.unwrap());
        assert!(service.moderate(&mut comment, &article, &context).await.unwrap());
        assert!(!comment.is_removed);
        assert_eq!(classifier.call_count(), 1);
    }

    #[tokio::test]
    async fn test_auto_rejects_definite_spam() {
        let service = service(
            spam_policy(SpamAction::Auto),
            MockClassifier::returning(SpamVerdict::DefiniteSpam),
        );

        let allowed = service
            .allow(&mut comment("buy now"), &fresh_article(), &RequestContext::default())
            .await
            .unwrap();

        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_auto_holds_and_removes_probable_spam() {
        let service = service(
            spam_policy(SpamAction::Auto),
            MockClassifier::returning(SpamVerdict::ProbableSpam),
        );
        let mut comment = comment("buy now");

        let decision = service
            .evaluate(&mut comment, &fresh_article(), &RequestContext::default())
            .await
            .unwrap();

        assert!(decision.allowed);
        assert!(decision.moderated);
        assert!(decision.removed);
        assert!(comment.is_removed);
    }

    #[tokio::test]
    async fn test_delete_rejects_all_spam_and_skips_moderate() {
        for verdict in [SpamVerdict::ProbableSpam, SpamVerdict::DefiniteSpam] {
            let classifier = MockClassifier::returning(verdict);
            let service = service(spam_policy(SpamAction::Delete), classifier.clone());
            let mut comment = comment("buy now");

            let decision = service
                .evaluate(&mut comment, &fresh_article(), &RequestContext::default())
                .await
                .unwrap();

            assert_eq!(decision, ModerationDecision::rejected(), "{verdict}");
            // moderate never ran, so the marker is untouched
            assert!(!comment.is_removed);
            assert_eq!(classifier.call_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_spam_reaching_moderate_is_marked_removed() {
        for action in [SpamAction::Auto, SpamAction::SoftDelete, SpamAction::Delete] {
            for verdict in [SpamVerdict::ProbableSpam, SpamVerdict::DefiniteSpam] {
                let service = service(spam_policy(action), MockClassifier::returning(verdict));
                let mut comment = comment("buy now");

                let held = service
                    .moderate(&mut comment, &fresh_article(), &RequestContext::default())
                    .await
                    .unwrap();

                assert!(held, "{action}/{verdict}");
                assert!(comment.is_removed, "{action}/{verdict}");
            }
        }
    }

    #[tokio::test]
    async fn test_moderate_action_holds_without_removing() {
        let service = service(
            spam_policy(SpamAction::Moderate),
            MockClassifier::returning(SpamVerdict::ProbableSpam),
        );
        let mut comment = comment("buy now");
        let article = fresh_article();
        let context = RequestContext::default();

        assert!(service.allow(&mut comment, &article, &context).await.unwrap());
        assert!(service.moderate(&mut comment, &article, &context).await.unwrap());
        assert!(!comment.is_removed);
    }

    #[tokio::test]
    async fn test_soft_delete_accepts_definite_spam_as_removed() {
        let service = service(
            spam_policy(SpamAction::SoftDelete),
            MockClassifier::returning(SpamVerdict::DefiniteSpam),
        );

        let decision = service
            .evaluate(&mut comment("buy now"), &fresh_article(), &RequestContext::default())
            .await
            .unwrap();

        assert_eq!(
            decision,
            ModerationDecision {
                allowed: true,
                moderated: true,
                removed: true,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_verdict_is_held_but_not_removed() {
        for action in [
            SpamAction::Delete,
            SpamAction::Auto,
            SpamAction::Moderate,
            SpamAction::SoftDelete,
        ] {
            let service = service(spam_policy(action), MockClassifier::returning(SpamVerdict::Unknown));

            let decision = service
                .evaluate(&mut comment("hmm"), &fresh_article(), &RequestContext::default())
                .await
                .unwrap();

            assert!(decision.allowed, "{action}");
            assert!(decision.moderated, "{action}");
            assert!(!decision.removed, "{action}");
        }
    }

    #[tokio::test]
    async fn test_denylist_word_holds_comment() {
        let service = service(
            dated(PolicyConfig::default()).with_denylist(["casino"]),
            MockClassifier::returning(SpamVerdict::None),
        );

        let held = service
            .moderate(
                &mut comment("Visit my Casino today"),
                &fresh_article(),
                &RequestContext::default(),
            )
            .await
            .unwrap();

        assert!(held);
    }

    #[tokio::test]
    async fn test_empty_denylist_publishes() {
        let service = service(
            dated(PolicyConfig::default()),
            MockClassifier::returning(SpamVerdict::None),
        );

        let decision = service
            .evaluate(
                &mut comment("Visit my Casino today"),
                &fresh_article(),
                &RequestContext::default(),
            )
            .await
            .unwrap();

        assert!(decision.allowed);
        assert!(!decision.moderated);
    }

    #[tokio::test]
    async fn test_clean_comment_checks_classifier_once() {
        let classifier = MockClassifier::returning(SpamVerdict::None);
        let service = service(spam_policy(SpamAction::Moderate), classifier.clone());

        let decision = service
            .evaluate(&mut comment("Thanks!"), &fresh_article(), &RequestContext::default())
            .await
            .unwrap();

        assert!(decision.allowed);
        assert!(!decision.moderated);
        assert_eq!(classifier.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_is_configuration_error() {
        let classifier = MockClassifier::returning(SpamVerdict::None);
        let service = service_with_key(spam_policy(SpamAction::Auto), classifier.clone(), None);

        let result = service
            .allow(&mut comment("hi"), &fresh_article(), &RequestContext::default())
            .await;

        assert!(matches!(result, Err(ModerationError::Configuration(_))));
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn test_service_error_surfaces_from_allow() {
        let service = service(
            spam_policy(SpamAction::Auto),
            MockClassifier::failing(SpamServiceError::InvalidCredential),
        );

        let result = service
            .allow(&mut comment("hi"), &fresh_article(), &RequestContext::default())
            .await;

        assert!(matches!(
            result,
            Err(ModerationError::SpamService(SpamServiceError::InvalidCredential))
        ));
    }

    #[tokio::test]
    async fn test_spam_check_disabled_never_calls_classifier() {
        let classifier = MockClassifier::returning(SpamVerdict::DefiniteSpam);
        let service = service(dated(PolicyConfig::default()), classifier.clone());

        let decision = service
            .evaluate(&mut comment("buy now"), &fresh_article(), &RequestContext::default())
            .await
            .unwrap();

        assert!(decision.allowed);
        assert!(!decision.moderated);
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_type_is_allowed_and_published() {
        let classifier = MockClassifier::returning(SpamVerdict::DefiniteSpam);
        let service = ModerationService::new(
            Arc::new(PolicyRegistry::default()),
            SpamChecker::new(
                classifier.clone(),
                Box::new(FixedSite("example.com")),
                SpamSettings::default(),
            ),
        );
        let article = fresh_article();

        let decision = service
            .evaluate(&mut comment("buy now"), &article, &RequestContext::default())
            .await
            .unwrap();

        assert!(decision.allowed);
        assert!(!decision.moderated);
        assert!(service.comments_are_open(&article));
        assert!(!service.comments_are_moderated(&article));
        assert_eq!(classifier.call_count(), 0);
    }

    #[test]
    fn moderation_error_messages_are_descriptive() {
        let error = ModerationError::Configuration("AKISMET_API_KEY missing".into());
        assert!(error.to_string().contains("AKISMET_API_KEY"));

        let error: ModerationError = SpamServiceError::InvalidCredential.into();
        assert_eq!(error.to_string(), "Spam service rejected the API key");
    }
}
