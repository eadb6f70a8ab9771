use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationErrors, is_valid_slug};

pub const CATEGORY_TITLE_MAX: usize = 256;
pub const CATEGORY_SLUG_MAX: usize = 64;

/// Category entity - a topic posts are filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Category fields editable by staff.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFields {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

impl Validate for CategoryFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, Some(CATEGORY_TITLE_MAX));
        errors.require_text("description", &self.description, None);
        errors.max_chars("slug", &self.slug, Some(CATEGORY_SLUG_MAX));
        if !is_valid_slug(&self.slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
        errors.into_result()
    }
}
