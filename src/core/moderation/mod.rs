// Core moderation module - decides whether comments are published, held or
// rejected.

mod env_config;
pub mod moderation_models;
pub mod moderation_service;
pub mod policy_registry;
pub mod spam_checker;
pub mod time_window;
pub mod word_matcher;

#[cfg(test)]
pub(crate) mod test_support;

pub use moderation_models::*;
pub use moderation_service::{ModerationError, ModerationService};
pub use policy_registry::{PolicyRegistry, RegistryError};
pub use spam_checker::{SiteResolver, SpamChecker, SpamClassifier, SpamServiceError, SpamSettings};
pub use time_window::TimeWindow;
pub use word_matcher::{contains_denied_word, split_words};
