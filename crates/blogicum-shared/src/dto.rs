//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::response::PaginatedResponse;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request to register a new user.
///
/// Missing fields deserialize as empty and are reported by validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

// ---------------------------------------------------------------------------
// Forms
//
// Every field has a default so that a missing value reaches validation and
// comes back as a field error instead of a rejected body.
// ---------------------------------------------------------------------------

/// Body of the post create/edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub location: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of the comment create/edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Body of the profile edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
}

/// Body of the admin page form. The slug defaults to one derived from the title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Body of the admin category form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default = "published_by_default")]
    pub is_published: bool,
}

/// Body of the admin location form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default = "published_by_default")]
    pub is_published: bool,
}

fn published_by_default() -> bool {
    true
}

/// `?page=` query string of listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// The current user, as returned by `/auth/me/` and the profile edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

/// A post with its author, taxonomy and comment count resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: String,
    pub category: Option<CategoryResponse>,
    pub location: Option<LocationResponse>,
    pub image: Option<String>,
    pub is_published: bool,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Post detail page: the post and its comments, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

/// Choices offered by the post form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormOptions {
    pub categories: Vec<CategoryResponse>,
    pub locations: Vec<LocationResponse>,
}

/// Category page: the category and one page of its posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPostsResponse {
    pub category: CategoryResponse,
    pub page_obj: PaginatedResponse<PostResponse>,
}

/// Profile page: the user and one page of their posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: UserResponse,
    pub page_obj: PaginatedResponse<PostResponse>,
}

/// A static informational page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticPageResponse {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_form_optional_fields_default() {
        let form: PostForm = serde_json::from_str(
            r#"{"title": "Trip", "text": "Notes", "pub_date": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(form.category, None);
        assert_eq!(form.location, None);
        assert_eq!(form.image, None);
    }

    #[test]
    fn test_taxonomy_forms_published_by_default() {
        let form: LocationForm = serde_json::from_str(r#"{"name": "Moscow"}"#).unwrap();
        assert!(form.is_published);
    }
}
