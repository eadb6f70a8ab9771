//! Who may change what.

use crate::domain::{Comment, Post, User};
use crate::error::DomainError;

/// Only the author edits or deletes a post.
pub fn can_manage_post(viewer: Option<i64>, post: &Post) -> bool {
    post.is_authored_by(viewer)
}

/// Only the author edits or deletes a comment.
pub fn can_manage_comment(viewer: Option<i64>, comment: &Comment) -> bool {
    comment.is_authored_by(viewer)
}

/// `Forbidden` unless `viewer` wrote the comment.
pub fn ensure_can_manage_comment(viewer: Option<i64>, comment: &Comment) -> Result<(), DomainError> {
    if can_manage_comment(viewer, comment) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// A profile is edited by the user whose current username matches the one in the URL.
pub fn can_edit_profile(viewer: Option<&User>, profile_username: &str) -> bool {
    viewer.is_some_and(|user| user.username == profile_username)
}

/// `Forbidden` unless `viewer` owns the profile at `profile_username`.
pub fn ensure_can_edit_profile(
    viewer: Option<&User>,
    profile_username: &str,
) -> Result<(), DomainError> {
    if can_edit_profile(viewer, profile_username) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// Whether a profile listing includes the owner's hidden posts.
pub fn sees_all_posts_of(viewer: Option<i64>, profile: &User) -> bool {
    viewer == Some(profile.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            is_staff: false,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_profile_edit_by_username() {
        let ada = user(1, "ada");
        assert!(can_edit_profile(Some(&ada), "ada"));
        assert!(!can_edit_profile(Some(&ada), "grace"));
        assert!(!can_edit_profile(None, "ada"));

        assert!(ensure_can_edit_profile(Some(&ada), "ada").is_ok());
        assert!(matches!(
            ensure_can_edit_profile(Some(&ada), "grace"),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn test_comment_management() {
        let comment = Comment {
            id: 5,
            text: "Nice".to_string(),
            post_id: 2,
            author_id: 9,
            created_at: Utc::now(),
        };
        assert!(can_manage_comment(Some(9), &comment));
        assert!(!can_manage_comment(Some(1), &comment));
        assert!(!can_manage_comment(None, &comment));

        assert!(ensure_can_manage_comment(Some(9), &comment).is_ok());
        assert!(matches!(
            ensure_can_manage_comment(Some(1), &comment),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn test_owner_sees_hidden_posts() {
        let ada = user(1, "ada");
        assert!(sees_all_posts_of(Some(1), &ada));
        assert!(!sees_all_posts_of(Some(2), &ada));
        assert!(!sees_all_posts_of(None, &ada));
    }
}
