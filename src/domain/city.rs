use std::fmt::Display;

use unicode_segmentation::UnicodeSegmentation;

/// Location the daily weather email reports on. Stored as entered, minus
/// surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City(String);

impl City {
    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();

        let is_empty = trimmed.is_empty();
        let is_too_long = trimmed.graphemes(true).count() > 256;
        let forbidden_characters = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        let contains_forbidden_characters = trimmed
            .chars()
            .any(|c| forbidden_characters.contains(&c));

        if is_empty || is_too_long || contains_forbidden_characters {
            Err(format!("{} is not a valid city name", s))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

impl Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for City {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
