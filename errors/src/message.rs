//! # Message Providers
//!
//! A message provider maps an error code to a human-readable title and
//! detail. Templates may contain `{param}` placeholders that are filled
//! from the exception's parameters by the filter.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageField {
    Title,
    Detail,
}

/// Lookup of message templates by error code.
///
/// Returning `None` means "no entry"; the filter then falls back to the
/// exception's own message.
pub trait MessageProvider: Send + Sync {
    fn message(&self, error_code: &str, field: MessageField) -> Option<String>;
}

/// Title and detail templates for one error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub title: Option<String>,
    pub detail: Option<String>,
}

/// In-memory provider, typically built once from a JSON catalogue.
///
/// ```
/// use errors::{MessageField, MessageProvider, StaticMessageProvider};
///
/// let provider = StaticMessageProvider::new()
///     .with_message("USER_NOT_FOUND", "User not found", "does not exist: {userId}");
/// assert_eq!(
///     provider.message("USER_NOT_FOUND", MessageField::Title).as_deref(),
///     Some("User not found")
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticMessageProvider {
    entries: HashMap<String, MessageEntry>,
}

impl StaticMessageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_message(
        mut self,
        error_code: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        self.entries.insert(
            error_code.into(),
            MessageEntry {
                title: Some(title.into()),
                detail: Some(detail.into()),
            },
        );
        self
    }

    /// Build from `{"CODE": {"title": "...", "detail": "..."}}`.
    pub fn from_json(catalogue: serde_json::Value) -> Result<Self, serde_json::Error> {
        let entries: HashMap<String, MessageEntry> = serde_json::from_value(catalogue)?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageProvider for StaticMessageProvider {
    fn message(&self, error_code: &str, field: MessageField) -> Option<String> {
        let entry = self.entries.get(error_code)?;
        match field {
            MessageField::Title => entry.title.clone(),
            MessageField::Detail => entry.detail.clone(),
        }
    }
}
