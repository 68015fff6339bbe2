//! Label-driven reporter configuration
//!
//! Reporter instances and their settings live in task labels under the
//! `complainer.<monitor>.` namespace:
//!
//! ```text
//! complainer.default.discord.instances = team-a,team-b
//! complainer.default.discord.team-a.url = https://discord.com/api/webhooks/...
//! complainer.default.discord.user_id    = 1234   (shared by all instances)
//! ```

use std::collections::HashMap;

use crate::Label;

const PREFIX: &str = "complainer";

const INSTANCES_KEY: &str = "instances";

/// Labels of one failure, viewed through the namespace of one monitor
#[derive(Debug, Clone)]
pub struct Labels {
    monitor: String,
    values: HashMap<String, String>,
}

impl Labels {
    /// Later duplicates of a key override earlier ones.
    pub fn new(monitor: &str, labels: &[Label]) -> Self {
        let values = labels
            .iter()
            .map(|label| (label.key.clone(), label.value.clone()))
            .collect();

        Self {
            monitor: monitor.to_string(),
            values,
        }
    }

    pub fn monitor(&self) -> &str {
        &self.monitor
    }

    /// Configured instance names of `reporter`, in label order
    ///
    /// Returns an empty list if the reporter is not configured for this failure.
    pub fn instances(&self, reporter: &str) -> Vec<String> {
        let Some(raw) = self.values.get(&self.key(&[reporter, INSTANCES_KEY])) else {
            return vec![];
        };

        let mut instances: Vec<String> = vec![];
        for instance in raw.split(',').map(str::trim) {
            if instance.is_empty() || instances.iter().any(|known| known == instance) {
                continue;
            }
            instances.push(instance.to_string());
        }
        instances
    }

    /// Setting `key` for one reporter instance, falling back to the
    /// reporter-wide setting
    pub fn get(&self, reporter: &str, instance: &str, key: &str) -> Option<&str> {
        self.values
            .get(&self.key(&[reporter, instance, key]))
            .or_else(|| self.values.get(&self.key(&[reporter, key])))
            .map(String::as_str)
    }

    fn key(&self, parts: &[&str]) -> String {
        let mut key = format!("{PREFIX}.{}", self.monitor);
        for part in parts {
            key.push('.');
            key.push_str(part);
        }
        key
    }
}
