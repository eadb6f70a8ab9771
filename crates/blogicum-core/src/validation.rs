//! Form validation shared by every write operation.

use std::fmt;
use std::sync::LazyLock;

use email_address::EmailAddress;
use regex::Regex;
use serde::Serialize;

/// Message for a required field left empty or missing.
pub const REQUIRED: &str = "This field is required.";

/// A single failed check on a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All failures collected while validating one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with a single entry.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Human-readable `field: message` lines.
    pub fn messages(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Check that a required text field is present and within `max` characters.
    pub fn require_text(&mut self, field: &'static str, value: &str, max: Option<usize>) {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
        } else {
            self.max_chars(field, value, max);
        }
    }

    /// Check an optional text field's length.
    pub fn max_chars(&mut self, field: &'static str, value: &str, max: Option<usize>) {
        if let Some(max) = max {
            let len = value.chars().count();
            if len > max {
                self.add(
                    field,
                    format!("Ensure this value has at most {max} characters (it has {len})."),
                );
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join(", "))
    }
}

/// Implemented by every form-like input.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));

static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern compiles"));

/// Letters, digits and `@ . + - _`, like the usernames the site has always accepted.
pub fn is_valid_username(username: &str) -> bool {
    USERNAME.is_match(username)
}

/// Letters, digits, hyphens and underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG.is_match(slug)
}

/// An RFC 5322 address whose domain has at least one dot.
pub fn is_valid_email(email: &str) -> bool {
    email
        .parse::<EmailAddress>()
        .is_ok_and(|address| address.domain().contains('.'))
}

/// Derive a slug from a title: ASCII alphanumerics kept and lowercased,
/// runs of anything else collapsed into a single hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(is_valid_username("jane.doe+blog@site_1-x"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("jane doe"));
        assert!(!is_valid_username("jane/doe"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("reader@example.com"));
        assert!(!is_valid_email("reader.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("reader@example"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("reader@example..com"));
        assert!(!is_valid_email("read er@example.com"));
    }

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("travel_notes-2024"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("travel notes"));
        assert!(!is_valid_slug("путешествия"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("About the Project"), "about-the-project");
        assert_eq!(slugify("  Rules!! of   the site "), "rules-of-the-site");
        assert_eq!(slugify("Правила"), "");
    }

    #[test]
    fn test_require_text_collects_errors() {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", "   ", Some(10));
        errors.require_text("text", "abcdefghijk", Some(10));
        errors.require_text("name", "ok", Some(10));

        assert_eq!(errors.errors().len(), 2);
        assert_eq!(errors.errors()[0].field, "title");
        assert_eq!(errors.errors()[1].field, "text");
        assert!(errors.into_result().is_err());
    }
}
