//! Engine configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// How strictly a schema document is checked at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Reject the whole document on a missing `order` or an empty category.
    Strict,
    /// Keep such entries and report them when the form is compiled.
    #[default]
    Lenient,
}

/// Severity of a notification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Text and display time of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoticeTemplate {
    /// Message shown to the user.
    pub message: String,
    /// How long the notification stays visible, in milliseconds.
    pub duration_ms: u64,
}

impl NoticeTemplate {
    /// Creates a new notice template.
    pub fn new(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            message: message.into(),
            duration_ms,
        }
    }

    /// Returns the display duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Configuration for a form session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Quiet period before a search input is evaluated, in milliseconds.
    pub search_debounce_ms: u64,
    /// Schema shape checking policy.
    pub schema_policy: SchemaPolicy,
    /// Notification emitted when a submission is rejected.
    pub rejection_notice: NoticeTemplate,
    /// Notification emitted when a submission is accepted.
    pub acceptance_notice: NoticeTemplate,
    /// Key of the provider selector in submitted data.
    pub provider_selector_label: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 500,
            schema_policy: SchemaPolicy::default(),
            rejection_notice: NoticeTemplate::new("Please fill out all required fields.", 4000),
            acceptance_notice: NoticeTemplate::new("Form submitted successfully!", 3000),
            provider_selector_label: "selectedProvider".to_string(),
        }
    }
}

impl FormConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a configuration from a JSON document. Missing keys keep their
    /// default values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the search debounce window.
    #[must_use]
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Sets the search debounce window.
    #[must_use]
    pub fn search_debounce_ms(mut self, ms: u64) -> Self {
        self.search_debounce_ms = ms;
        self
    }

    /// Sets the schema policy.
    #[must_use]
    pub fn schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.schema_policy = policy;
        self
    }

    /// Sets the rejection notification.
    #[must_use]
    pub fn rejection_notice(mut self, notice: NoticeTemplate) -> Self {
        self.rejection_notice = notice;
        self
    }

    /// Sets the acceptance notification.
    #[must_use]
    pub fn acceptance_notice(mut self, notice: NoticeTemplate) -> Self {
        self.acceptance_notice = notice;
        self
    }

    /// Sets the key used for the provider selector in submitted data.
    #[must_use]
    pub fn provider_selector_label(mut self, label: impl Into<String>) -> Self {
        self.provider_selector_label = label.into();
        self
    }
}
