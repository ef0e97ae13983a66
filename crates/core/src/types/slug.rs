//! URL slugs for categories and products.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug may only contain lowercase letters, digits, hyphens and underscores")]
    InvalidCharacter,
}

/// A URL-safe identifier such as `green-tea` used in catalog URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub const MAX_LENGTH: usize = 200;

    /// Validate an existing slug.
    ///
    /// # Errors
    ///
    /// Returns a [`SlugError`] if the input is empty, too long, or contains
    /// anything other than `a-z`, `0-9`, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name.
    ///
    /// Non-alphanumeric runs collapse into a single hyphen:
    /// `"Product 12"` becomes `product-12`.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if the name has no ASCII alphanumerics.
    pub fn slugify(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }
        out.truncate(Self::MAX_LENGTH);
        Self::parse(out.trim_end_matches('-'))
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(Slug::slugify("Product 12").unwrap().as_str(), "product-12");
        assert_eq!(
            Slug::slugify("  First   Category! ").unwrap().as_str(),
            "first-category"
        );
        assert_eq!(Slug::slugify("?!").unwrap_err(), SlugError::Empty);
    }

    #[test]
    fn test_parse() {
        assert!(Slug::parse("slug-1").is_ok());
        assert!(Slug::parse("snake_case").is_ok());
        assert_eq!(Slug::parse("Upper"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Slug>("\"tea\"").is_ok());
        assert!(serde_json::from_str::<Slug>("\"Not A Slug\"").is_err());
    }
}
