use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Category;
use crate::validation::{Validate, ValidationErrors};

pub const POST_TITLE_MAX: usize = 256;
pub const POST_IMAGE_MAX: usize = 255;

/// Post entity - a published or draft blog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Published, due, and filed under a published category.
    ///
    /// `category` must be the post's own category, if it has one.
    pub fn is_public(&self, category: Option<&Category>, now: DateTime<Utc>) -> bool {
        self.is_published
            && self.pub_date <= now
            && category.is_some_and(|c| Some(c.id) == self.category_id && c.is_published)
    }

    pub fn is_authored_by(&self, user_id: Option<i64>) -> bool {
        user_id == Some(self.author_id)
    }

    /// Whether `viewer` may see the post at all.
    pub fn is_visible_to(
        &self,
        category: Option<&Category>,
        viewer: Option<i64>,
        now: DateTime<Utc>,
    ) -> bool {
        self.is_authored_by(viewer) || self.is_public(category, now)
    }
}

/// The editable part of a post, as submitted through the post form.
///
/// The author is not part of it: it is fixed when the post is created.
#[derive(Debug, Clone, PartialEq)]
pub struct PostChanges {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub image: Option<String>,
}

impl Validate for PostChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, Some(POST_TITLE_MAX));
        errors.require_text("text", &self.text, None);
        if let Some(image) = &self.image {
            errors.max_chars("image", image, Some(POST_IMAGE_MAX));
        }
        errors.into_result()
    }
}

/// A post about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub author_id: i64,
    pub is_published: bool,
    pub fields: PostChanges,
}

impl NewPost {
    /// New posts are published by default; visibility is governed by `pub_date`.
    pub fn new(author_id: i64, fields: PostChanges) -> Self {
        Self {
            author_id,
            is_published: true,
            fields,
        }
    }
}

/// Which posts a listing may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostVisibility {
    /// Only posts that are public at `now`.
    Public { now: DateTime<Utc> },
    /// Everything, drafts included. Used for an author's own profile.
    All,
}

/// Filter for post listings. Results are always ordered by `pub_date`, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub visibility: PostVisibility,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl PostQuery {
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            visibility: PostVisibility::Public { now },
            category_id: None,
            author_id: None,
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Every post of one author, unpublished ones included.
    pub fn all_by_author(author_id: i64) -> Self {
        Self {
            visibility: PostVisibility::All,
            category_id: None,
            author_id: Some(author_id),
        }
    }

    /// In-memory evaluation of the filter against one post.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        let visible = match self.visibility {
            PostVisibility::Public { now } => post.is_public(category, now),
            PostVisibility::All => true,
        };
        visible
            && self.category_id.is_none_or(|id| post.category_id == Some(id))
            && self.author_id.is_none_or(|id| post.author_id == id)
    }
}

/// A post together with its comment count, as shown in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct PostListing {
    pub post: Post,
    pub comment_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn category(id: i64, is_published: bool) -> Category {
        Category {
            id,
            title: "Travel".to_string(),
            description: String::new(),
            slug: "travel".to_string(),
            is_published,
            created_at: Utc::now(),
        }
    }

    fn post(author_id: i64, pub_date: DateTime<Utc>, is_published: bool) -> Post {
        Post {
            id: 1,
            title: "Trip".to_string(),
            text: "Notes".to_string(),
            pub_date,
            author_id,
            category_id: Some(3),
            location_id: None,
            image: None,
            is_published,
            created_at: pub_date,
        }
    }

    #[test]
    fn test_public_requires_all_three_conditions() {
        let now = Utc::now();
        let published = category(3, true);
        let hidden = category(3, false);

        assert!(post(1, now - Duration::hours(1), true).is_public(Some(&published), now));
        assert!(!post(1, now - Duration::hours(1), false).is_public(Some(&published), now));
        assert!(!post(1, now + Duration::hours(1), true).is_public(Some(&published), now));
        assert!(!post(1, now - Duration::hours(1), true).is_public(Some(&hidden), now));
        assert!(!post(1, now - Duration::hours(1), true).is_public(None, now));
    }

    #[test]
    fn test_author_sees_own_draft() {
        let now = Utc::now();
        let draft = post(7, now + Duration::days(1), false);

        assert!(draft.is_visible_to(None, Some(7), now));
        assert!(!draft.is_visible_to(None, Some(8), now));
        assert!(!draft.is_visible_to(None, None, now));
    }

    #[test]
    fn test_query_matches() {
        let now = Utc::now();
        let published = category(3, true);
        let p = post(7, now - Duration::minutes(5), true);

        assert!(PostQuery::public(now).matches(&p, Some(&published)));
        assert!(PostQuery::public(now).in_category(3).matches(&p, Some(&published)));
        assert!(!PostQuery::public(now).in_category(4).matches(&p, Some(&published)));
        assert!(!PostQuery::public(now).by_author(8).matches(&p, Some(&published)));

        let draft = post(7, now + Duration::days(1), false);
        assert!(!PostQuery::public(now).matches(&draft, Some(&published)));
        assert!(PostQuery::all_by_author(7).matches(&draft, None));
    }

    #[test]
    fn test_changes_validation() {
        let changes = PostChanges {
            title: "x".repeat(POST_TITLE_MAX + 1),
            text: "  ".to_string(),
            pub_date: Utc::now(),
            category_id: None,
            location_id: None,
            image: None,
        };

        let errors = changes.validate().unwrap_err();
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "text"]);
    }
}
