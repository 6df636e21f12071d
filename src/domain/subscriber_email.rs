use std::fmt::Display;

use validator::validate_email;

/// Uniqueness key for a subscriber. Input is trimmed and ASCII-lowercased
/// before validation, so two spellings of the same address map to the same
/// stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        let normalized = s.trim().to_ascii_lowercase();
        match validate_email(&normalized) {
            true => Ok(Self(normalized)),
            false => Err(format!("{} is not a valid subscriber email", s)),
        }
    }
}

impl Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
