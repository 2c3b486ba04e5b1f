// Moderation domain models - data structures for the comment policy engine.
//
// These are pure domain types with no HTTP or storage dependencies.
// The content store and the web layer build these and hand them to the engine.

use super::env_config::{env_flag, env_parse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Verdict returned by the remote spam classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpamVerdict {
    /// Not spam (ham)
    None,
    /// The service could not decide
    Unknown,
    /// Probably spam
    ProbableSpam,
    /// Blatant spam, safe to discard
    DefiniteSpam,
}

impl SpamVerdict {
    /// `probable_spam` or `definite_spam`.
    pub fn is_spam(&self) -> bool {
        matches!(self, SpamVerdict::ProbableSpam | SpamVerdict::DefiniteSpam)
    }

    /// Anything other than `none` needs a human to look at it.
    pub fn is_flagged(&self) -> bool {
        *self != SpamVerdict::None
    }
}

impl std::fmt::Display for SpamVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpamVerdict::None => write!(f, "none"),
            SpamVerdict::Unknown => write!(f, "unknown"),
            SpamVerdict::ProbableSpam => write!(f, "probable_spam"),
            SpamVerdict::DefiniteSpam => write!(f, "definite_spam"),
        }
    }
}

/// What to do with a comment the spam classifier flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpamAction {
    /// Reject probable and definite spam outright
    Delete,
    /// Reject definite spam, hold and mark probable spam as removed
    Auto,
    /// Hold every flagged comment in the moderation queue
    Moderate,
    /// Accept spam but hold it with the removed marker set
    #[default]
    SoftDelete,
}

impl std::fmt::Display for SpamAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpamAction::Delete => write!(f, "delete"),
            SpamAction::Auto => write!(f, "auto"),
            SpamAction::Moderate => write!(f, "moderate"),
            SpamAction::SoftDelete => write!(f, "soft_delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown spam action '{0}', expected one of: delete, auto, moderate, soft_delete")]
pub struct ParseSpamActionError(pub String);

impl FromStr for SpamAction {
    type Err = ParseSpamActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delete" => Ok(SpamAction::Delete),
            "auto" => Ok(SpamAction::Auto),
            "moderate" => Ok(SpamAction::Moderate),
            "soft_delete" => Ok(SpamAction::SoftDelete),
            other => Err(ParseSpamActionError(other.to_string())),
        }
    }
}

/// Moderation settings for one content type.
///
/// Built once at startup and registered in the `PolicyRegistry`; never mutated
/// while comments are being evaluated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Close the comment window this many days after publication
    pub close_after_days: Option<u32>,
    /// Hold new comments for review this many days after publication
    pub moderate_after_days: Option<u32>,
    /// Lowercase words that force a hold when present in a comment
    pub denylist: BTreeSet<String>,
    /// Whether to ask the spam classifier about each comment
    pub spam_check_enabled: bool,
    /// What to do with flagged comments
    pub spam_action: SpamAction,
    /// Name of the publication timestamp field on the content object
    pub publication_date_field: Option<String>,
    /// Name of the "enable comments" flag on the content object
    pub enable_comments_field: Option<String>,
}

impl PolicyConfig {
    /// Build the default policy from `COMMENTS_*` environment variables.
    ///
    /// Unparsable values are ignored and the built-in default is used.
    pub fn from_env() -> Self {
        let close_after_days = env_parse::<u32>("COMMENTS_CLOSE_AFTER_DAYS");
        let moderate_after_days = env_parse::<u32>("COMMENTS_MODERATE_AFTER_DAYS");
        let spam_check_enabled = env_flag("COMMENTS_USE_AKISMET");
        let spam_action = env_parse::<SpamAction>("COMMENTS_AKISMET_ACTION").unwrap_or_default();
        let denylist = std::env::var("COMMENTS_MODERATE_BAD_WORDS")
            .map(|v| v.split(',').map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();

        Self {
            close_after_days,
            moderate_after_days,
            spam_check_enabled,
            spam_action,
            ..Default::default()
        }
        .with_denylist(denylist)
    }

    /// Replace the denylist, lowercasing and trimming every entry.
    pub fn with_denylist<I, W>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        self.denylist = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        self
    }

    pub(crate) fn normalized(mut self) -> Self {
        let words = std::mem::take(&mut self.denylist);
        self.with_denylist(words)
    }
}

/// A comment as submitted, before it is stored.
///
/// The engine writes to exactly two places on it: `is_removed` and the
/// per-evaluation spam verdict slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    /// The comment text
    pub body: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    /// Address the comment was submitted from
    pub ip_address: Option<String>,
    pub submit_date: DateTime<Utc>,
    /// Set when a flagged comment should be hidden as spam
    #[serde(default)]
    pub is_removed: bool,
    #[serde(skip)]
    spam_verdict: Option<SpamVerdict>,
}

impl Comment {
    pub fn new(body: impl Into<String>, submit_date: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            submit_date,
            ..Default::default()
        }
    }

    /// Verdict cached by an earlier spam check in this evaluation, if any.
    pub fn cached_verdict(&self) -> Option<SpamVerdict> {
        self.spam_verdict
    }

    pub(crate) fn cache_verdict(&mut self, verdict: SpamVerdict) {
        self.spam_verdict = Some(verdict);
    }
}

/// The user submitting a comment, when known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmittingUser {
    pub id: u64,
    #[serde(default)]
    pub is_superuser: bool,
}

/// Ambient data from the submission request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub user: Option<SubmittingUser>,
    pub is_secure: bool,
}

/// The thing being commented on (an article, a blog post, ...).
///
/// Only `content_type` and `absolute_url` are required. Field lookups return
/// `None` when the object has no such field, which the policy treats as
/// "not configured" rather than as an error.
pub trait ContentObject: Send + Sync {
    /// Key used to find the registered policy
    fn content_type(&self) -> &str;

    /// Site-relative (or absolute) URL of the object, used for permalinks
    fn absolute_url(&self) -> String;

    fn datetime_field(&self, _field: &str) -> Option<DateTime<Utc>> {
        None
    }

    fn bool_field(&self, _field: &str) -> Option<bool> {
        None
    }

    /// Objects that know their language return themselves here.
    fn as_language_aware(&self) -> Option<&dyn LanguageAware> {
        None
    }
}

/// Optional capability for translatable or single-language content.
pub trait LanguageAware {
    /// Language the object is currently rendered in
    fn current_language(&self) -> Option<String>;

    /// Fixed language code stored on the object
    fn language_code(&self) -> Option<String> {
        None
    }

    fn language_hint(&self) -> Option<String> {
        self.current_language().or_else(|| self.language_code())
    }
}

/// Payload sent to the spam classifier for one comment.
#[derive(Debug, Clone, PartialEq)]
pub struct SpamCheckRequest {
    pub permalink: String,
    pub comment_type: &'static str,
    pub comment_author: String,
    pub comment_author_email: String,
    pub comment_author_url: String,
    pub comment_content: String,
    pub comment_date: DateTime<Utc>,
    pub referrer: String,
    pub user_agent: String,
    pub user_ip: String,
    /// `"administrator"` for privileged users, which always passes the test
    pub user_role: Option<&'static str>,
    pub blog_lang: Option<String>,
}

/// Outcome of a full evaluation: `allow`, then `moderate` if allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationDecision {
    pub allowed: bool,
    pub moderated: bool,
    pub removed: bool,
}

impl ModerationDecision {
    pub fn rejected() -> Self {
        Self {
            allowed: false,
            moderated: false,
            removed: false,
        }
    }
}
