//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Platform-assigned identity of the person on the other end of a conversation.
///
/// For WhatsApp this is the sender's phone number in international format
/// without the leading `+`. The value is opaque to the domain; only emptiness
/// and length are validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(String);

impl SenderId {
    /// Longest identifier accepted from the platform.
    pub const MAX_LEN: usize = 64;

    /// Creates a SenderId, rejecting empty or oversized values.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("sender_id"));
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(ValidationError::invalid_format(
                "sender_id",
                format!("longer than {} characters", Self::MAX_LEN),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier safe to put in logs: everything but the last four characters is hidden.
    pub fn masked(&self) -> String {
        let visible: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("***{}", visible)
    }

    /// Identifier reduced to characters that are safe inside a file name.
    pub fn file_safe(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SenderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Unique identifier for one execution of the document flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    /// Creates a new random ExecutionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex characters, enough to tell executions apart in file names.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_id_trims_whitespace() {
        let id = SenderId::new("  15551234567 ").unwrap();
        assert_eq!(id.as_str(), "15551234567");
    }

    #[test]
    fn sender_id_rejects_empty() {
        assert!(SenderId::new("").is_err());
        assert!(SenderId::new("   ").is_err());
    }

    #[test]
    fn sender_id_rejects_oversized() {
        let long = "1".repeat(SenderId::MAX_LEN + 1);
        assert!(SenderId::new(long).is_err());
    }

    #[test]
    fn masked_keeps_last_four_characters() {
        let id = SenderId::new("15551234567").unwrap();
        assert_eq!(id.masked(), "***4567");

        let short = SenderId::new("42").unwrap();
        assert_eq!(short.masked(), "***42");
    }

    #[test]
    fn file_safe_replaces_separators() {
        let id = SenderId::new("+1 555/123").unwrap();
        assert_eq!(id.file_safe(), "_1_555_123");
    }

    #[test]
    fn execution_ids_are_unique() {
        let a = ExecutionId::new();
        let b = ExecutionId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }
}
