// Time-based comment window checks.
//
// Pure functions of the policy, the content object and the current time.

use super::moderation_models::{ContentObject, PolicyConfig};
use chrono::{DateTime, Duration, Utc};

/// Read-only view over the date-related parts of a policy.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindow<'a> {
    policy: &'a PolicyConfig,
}

impl<'a> TimeWindow<'a> {
    pub fn new(policy: &'a PolicyConfig) -> Self {
        Self { policy }
    }

    /// Are comments still accepted on `target` at `now`?
    pub fn is_open(&self, target: &dyn ContentObject, now: DateTime<Utc>) -> bool {
        if let Some(field) = self.policy.enable_comments_field.as_deref() {
            if target.bool_field(field) == Some(false) {
                return false;
            }
        }

        match self.policy.close_after_days {
            Some(days) => !self.older_than(target, now, days),
            None => true,
        }
    }

    /// Has `target` been published long enough that new comments need review?
    pub fn past_moderate_after(&self, target: &dyn ContentObject, now: DateTime<Utc>) -> bool {
        match self.policy.moderate_after_days {
            Some(days) => self.older_than(target, now, days),
            None => false,
        }
    }

    fn older_than(&self, target: &dyn ContentObject, now: DateTime<Utc>, days: u32) -> bool {
        let Some(field) = self.policy.publication_date_field.as_deref() else {
            return false;
        };

        // No publication date yet means the clock hasn't started
        match target.datetime_field(field) {
            Some(published) => now - published > Duration::days(i64::from(days)),
            None => false,
        }
    }
}
