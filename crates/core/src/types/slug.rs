//! URL slugs for catalog items.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug may only contain lowercase letters, digits, '-' and '_' (found {0:?})")]
    InvalidChar(char),
}

/// The unique, URL-safe handle of a catalog item (e.g. `"blue-shirt"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length, matching the database column.
    pub const MAX_LENGTH: usize = 100;

    /// Parse a slug.
    ///
    /// # Errors
    ///
    /// Returns a [`SlugError`] if the input is empty, too long, or contains
    /// anything other than `[a-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(SlugError::InvalidChar(c));
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Slug::parse("widget").is_ok());
        assert!(Slug::parse("blue-shirt_2").is_ok());
    }

    #[test]
    fn test_parse_rejects_uppercase_and_spaces() {
        assert_eq!(Slug::parse("Widget"), Err(SlugError::InvalidChar('W')));
        assert_eq!(Slug::parse("a b"), Err(SlugError::InvalidChar(' ')));
    }

    #[test]
    fn test_parse_rejects_empty_and_long() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert!(matches!(
            Slug::parse(&"a".repeat(101)),
            Err(SlugError::TooLong { .. })
        ));
    }
}
