//! Start command recognition.

use crate::domain::foundation::ValidationError;

/// The command that starts a flow, e.g. `/timetable`.
///
/// Matching is an exact comparison against the trimmed, lowercased message
/// body. Substrings never match, so "send me the /timetable please" is just
/// another message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCommand {
    normalized: String,
}

impl StartCommand {
    /// Creates a command from its configured spelling.
    pub fn new(command: impl AsRef<str>) -> Result<Self, ValidationError> {
        let normalized = normalize(command.as_ref());
        if normalized.is_empty() {
            return Err(ValidationError::empty_field("start_command"));
        }
        Ok(Self { normalized })
    }

    /// Returns true if `text` is exactly this command.
    pub fn matches(&self, text: &str) -> bool {
        normalize(text) == self.normalized
    }

    /// Normalized spelling of the command.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn timetable() -> StartCommand {
        StartCommand::new("/timetable").unwrap()
    }

    #[test]
    fn matches_exact_command() {
        assert!(timetable().matches("/timetable"));
    }

    #[test]
    fn matches_ignoring_case_and_surrounding_whitespace() {
        assert!(timetable().matches("  /TimeTable \n"));
    }

    #[test]
    fn rejects_substring() {
        assert!(!timetable().matches("please /timetable"));
        assert!(!timetable().matches("/timetable now"));
        assert!(!timetable().matches("/time"));
    }

    #[test]
    fn rejects_empty_command() {
        assert!(StartCommand::new("   ").is_err());
    }

    #[test]
    fn configured_spelling_is_normalized() {
        let cmd = StartCommand::new(" /Timetable ").unwrap();
        assert_eq!(cmd.as_str(), "/timetable");
        assert!(cmd.matches("/timetable"));
    }

    proptest! {
        #[test]
        fn padding_and_case_never_change_the_match(
            left in "[ \t\n]{0,4}",
            right in "[ \t\n]{0,4}",
            upper in any::<bool>(),
        ) {
            let body = if upper { "/TIMETABLE" } else { "/timetable" };
            let text = format!("{}{}{}", left, body, right);
            prop_assert!(timetable().matches(&text));
        }

        #[test]
        fn extra_visible_characters_never_match(
            prefix in "[a-z0-9]{1,6}",
            suffix in "[a-z0-9]{0,6}",
        ) {
            let text = format!("{} /timetable{}", prefix, suffix);
            prop_assert!(!timetable().matches(&text));
        }
    }
}
