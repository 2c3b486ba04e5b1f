// A content object described as plain data, for callers that don't have their
// own model type (the CLI, fixtures, JSON submissions).

use crate::core::moderation::{ContentObject, LanguageAware};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub content_type: String,
    /// Site-relative URL of the object
    pub url: String,
    /// Named fields; timestamps as RFC 3339 strings, flags as booleans
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub language: Option<String>,
}

impl ContentRecord {
    pub fn new(content_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            url: url.into(),
            fields: HashMap::new(),
            language: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

impl ContentObject for ContentRecord {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn absolute_url(&self) -> String {
        self.url.clone()
    }

    fn datetime_field(&self, field: &str) -> Option<DateTime<Utc>> {
        self.fields
            .get(field)
            .and_then(|v| v.as_str())
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn bool_field(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(|v| v.as_bool())
    }

    fn as_language_aware(&self) -> Option<&dyn LanguageAware> {
        Some(self)
    }
}

impl LanguageAware for ContentRecord {
    fn current_language(&self) -> Option<String> {
        None
    }

    fn language_code(&self) -> Option<String> {
        self.language.clone()
    }
}
