use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationErrors, is_valid_slug, slugify};

pub const PAGE_SLUG_MAX: usize = 50;
pub const PAGE_TITLE_MAX: usize = 200;

/// Page entity - static informational content rendered by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// Page fields editable through the admin interface.
///
/// `updated_at` is not among them: storage stamps it on every save.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFields {
    pub slug: String,
    pub title: String,
    pub content: String,
}

impl PageFields {
    /// Build the fields, prepopulating the slug from the title when none is given.
    pub fn new(slug: Option<String>, title: String, content: String) -> Self {
        let slug = slug
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| slugify(&title));
        Self {
            slug,
            title,
            content,
        }
    }
}

impl Validate for PageFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, Some(PAGE_TITLE_MAX));
        errors.require_text("content", &self.content, None);
        errors.max_chars("slug", &self.slug, Some(PAGE_SLUG_MAX));
        if !is_valid_slug(&self.slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_prepopulated_from_title() {
        let fields = PageFields::new(None, "About Us".to_string(), "Hi".to_string());
        assert_eq!(fields.slug, "about-us");
        assert!(fields.validate().is_ok());

        let fields = PageFields::new(Some(" rules ".to_string()), "Site rules".to_string(), "Be nice".to_string());
        assert_eq!(fields.slug, "rules");
    }

    #[test]
    fn test_untranslatable_title_needs_explicit_slug() {
        let fields = PageFields::new(None, "О проекте".to_string(), "Текст".to_string());
        let errors = fields.validate().unwrap_err();
        assert_eq!(errors.errors()[0].field, "slug");
    }
}
