// Policy registry - which moderation policy applies to which content type.
//
// Populated once at startup, then shared read-only (usually behind an `Arc`)
// by every request. Registration needs `&mut self`, so nothing can change it
// after it has been handed out.

use super::moderation_models::{ContentObject, PolicyConfig};
use super::time_window::TimeWindow;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Policy for '{0}' must be a JSON object")]
    NotAnObject(String),
}

#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    /// Values used for fields a registration doesn't set
    defaults: PolicyConfig,
    policies: HashMap<String, PolicyConfig>,
}

impl PolicyRegistry {
    pub fn new(defaults: PolicyConfig) -> Self {
        Self {
            defaults: defaults.normalized(),
            policies: HashMap::new(),
        }
    }

    /// Register `config` for `content_type`. Returns the policy it replaced.
    pub fn register(
        &mut self,
        content_type: impl Into<String>,
        config: PolicyConfig,
    ) -> Option<PolicyConfig> {
        let content_type = content_type.into();
        let previous = self.policies.insert(content_type.clone(), config.normalized());

        if previous.is_some() {
            tracing::debug!(content_type = %content_type, "Replaced moderation policy");
        } else {
            tracing::debug!(content_type = %content_type, "Registered moderation policy");
        }
        previous
    }

    /// Register `content_type` with the default policy, reading the publication
    /// date and the "enable comments" flag from the named fields.
    pub fn register_model(
        &mut self,
        content_type: impl Into<String>,
        publication_date_field: Option<&str>,
        enable_comments_field: Option<&str>,
    ) -> Option<PolicyConfig> {
        let config = PolicyConfig {
            publication_date_field: publication_date_field.map(str::to_string),
            enable_comments_field: enable_comments_field.map(str::to_string),
            ..self.defaults.clone()
        };
        self.register(content_type, config)
    }

    pub fn lookup(&self, content_type: &str) -> Option<&PolicyConfig> {
        self.policies.get(content_type)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Register every policy in a JSON file shaped like
    /// `{ "content_type": { ...PolicyConfig fields... } }`.
    ///
    /// Fields missing from an entry take their value from the registry defaults.
    /// Returns how many policies were registered.
    pub fn load_json_file(&mut self, path: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        self.load_json_str(&contents)
    }

    /// All-or-nothing: if any entry is invalid, nothing is registered.
    pub fn load_json_str(&mut self, json: &str) -> Result<usize, RegistryError> {
        let entries: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let defaults = serde_json::to_value(&self.defaults)?;

        let mut parsed = Vec::with_capacity(entries.len());
        for (content_type, overrides) in entries {
            let serde_json::Value::Object(fields) = overrides else {
                return Err(RegistryError::NotAnObject(content_type));
            };

            let mut merged = defaults.clone();
            if let Some(target) = merged.as_object_mut() {
                target.extend(fields);
            }

            let config: PolicyConfig = serde_json::from_value(merged)?;
            parsed.push((content_type, config));
        }

        let count = parsed.len();
        for (content_type, config) in parsed {
            self.register(content_type, config);
        }

        tracing::info!(count, "Loaded moderation policies");
        Ok(count)
    }

    /// Are comments open on `target`? Unregistered types are always open.
    pub fn comments_are_open(&self, target: &dyn ContentObject) -> bool {
        self.comments_are_open_at(target, Utc::now())
    }

    pub fn comments_are_open_at(&self, target: &dyn ContentObject, now: DateTime<Utc>) -> bool {
        match self.lookup(target.content_type()) {
            Some(policy) => TimeWindow::new(policy).is_open(target, now),
            None => true,
        }
    }

    /// Will new comments on `target` be held for review because of its age?
    /// Unregistered types are never moderated.
    pub fn comments_are_moderated(&self, target: &dyn ContentObject) -> bool {
        self.comments_are_moderated_at(target, Utc::now())
    }

    pub fn comments_are_moderated_at(
        &self,
        target: &dyn ContentObject,
        now: DateTime<Utc>,
    ) -> bool {
        match self.lookup(target.content_type()) {
            Some(policy) => TimeWindow::new(policy).past_moderate_after(target, now),
            None => false,
        }
    }
}
