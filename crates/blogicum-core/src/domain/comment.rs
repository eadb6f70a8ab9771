use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationErrors};

/// Comment entity - a reply attached to exactly one post.
///
/// `post_id` and `author_id` never change after creation; repositories only
/// ever write `text` on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub post_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_authored_by(&self, user_id: Option<i64>) -> bool {
        user_id == Some(self.author_id)
    }

    pub fn belongs_to(&self, post_id: i64) -> bool {
        self.post_id == post_id
    }
}

/// A comment about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

/// Body of the comment form.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentText(pub String);

impl Validate for CommentText {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("text", &self.0, None);
        errors.into_result()
    }
}
