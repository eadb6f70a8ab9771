//! Post handlers: feed, detail, create, edit, delete.

use actix_web::{HttpResponse, http::header, web};
use chrono::Utc;

use blogicum_core::domain::{NewPost, Post, PostChanges, PostListing, PostQuery};
use blogicum_core::error::DomainError;
use blogicum_core::pagination::PageRequest;
use blogicum_core::policy::can_manage_post;
use blogicum_core::ports::BaseRepository;
use blogicum_core::validation::{REQUIRED, Validate, ValidationErrors};
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{PageQuery, PostDetailResponse, PostForm, PostFormOptions, PostResponse};

use super::{parse_form, post_url, present, profile_url, see_other};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET / - public posts, newest first.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::new(query.into_inner().page);
    let posts = state.posts.list(PostQuery::public(Utc::now()), &page).await?;

    Ok(HttpResponse::Ok().json(present::page_of_posts(&state, posts).await?))
}

/// GET /posts/{id}/
pub async fn detail(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let post = visible_post(&state, path.into_inner(), viewer.user_id()).await?;
    let comments = state.comments.list_for_post(post.id).await?;

    let comment_count = comments.len() as u64;
    let post = one_post(&state, post, comment_count).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post,
        comments: present::comments(&state, comments).await?,
    }))
}

/// GET /posts/create/ - choices for the post form.
pub async fn create_form(
    _identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let categories = state.categories.list().await?;
    let locations = state.locations.list().await?;

    Ok(HttpResponse::Ok().json(PostFormOptions {
        categories: categories.iter().map(present::category).collect(),
        locations: locations.iter().map(present::location).collect(),
    }))
}

/// POST /posts/create/
pub async fn create(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let author = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    let changes = post_changes(&state, body.into_inner()).await?;
    let post = state.posts.create(NewPost::new(author.id, changes)).await?;

    tracing::info!(post_id = post.id, author = %author.username, "Post created");

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, profile_url(&author.username)))
        .json(one_post(&state, post, 0).await?))
}

/// GET /posts/{id}/edit/ - the current values, for the author only.
pub async fn edit_form(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let post = existing_post(&state, path.into_inner()).await?;
    if !can_manage_post(viewer.user_id(), &post) {
        return Ok(see_other(post_url(post.id)));
    }

    let comment_count = state.comments.list_for_post(post.id).await?.len() as u64;
    Ok(HttpResponse::Ok().json(one_post(&state, post, comment_count).await?))
}

/// POST /posts/{id}/edit/
///
/// The body is read raw and only parsed once the author is known, so that
/// anyone else is redirected whatever they sent.
pub async fn edit(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    viewer: OptionalIdentity,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let post = existing_post(&state, path.into_inner()).await?;
    if !can_manage_post(viewer.user_id(), &post) {
        return Ok(see_other(post_url(post.id)));
    }

    let changes = post_changes(&state, parse_form(&body)?).await?;
    let post = state.posts.update(post.id, changes).await?;
    let comment_count = state.comments.list_for_post(post.id).await?.len() as u64;

    tracing::info!(post_id = post.id, "Post updated");

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, post_url(post.id)))
        .json(one_post(&state, post, comment_count).await?))
}

/// GET /posts/{id}/delete/ - the post, for confirmation.
pub async fn delete_form(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    edit_form(state, path, viewer).await
}

/// POST /posts/{id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let post = existing_post(&state, path.into_inner()).await?;
    if !can_manage_post(viewer.user_id(), &post) {
        return Ok(see_other(post_url(post.id)));
    }

    state.posts.delete(post.id).await?;
    tracing::info!(post_id = post.id, "Post deleted");

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, "/"))
        .json(ApiResponse::<()>::message("Post deleted")))
}

async fn existing_post(state: &AppState, id: i64) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", id).into())
}

/// The post, unless `viewer` may not see it. Hidden posts look missing.
pub(super) async fn visible_post(
    state: &AppState,
    id: i64,
    viewer: Option<i64>,
) -> AppResult<Post> {
    let post = existing_post(state, id).await?;
    let category = match post.category_id {
        Some(category_id) => state.categories.find_by_id(category_id).await?,
        None => None,
    };

    if post.is_visible_to(category.as_ref(), viewer, Utc::now()) {
        Ok(post)
    } else {
        Err(DomainError::not_found("Post", id).into())
    }
}

async fn one_post(state: &AppState, post: Post, comment_count: u64) -> AppResult<PostResponse> {
    present::posts(state, vec![PostListing { post, comment_count }])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Internal("post lost while rendering".to_string()).into())
}

/// Validate the form, including that the referenced category and location exist.
async fn post_changes(state: &AppState, form: PostForm) -> AppResult<PostChanges> {
    let pub_date = form.pub_date;
    let changes = PostChanges {
        title: form.title,
        text: form.text,
        pub_date: pub_date.unwrap_or_else(Utc::now),
        category_id: form.category,
        location_id: form.location,
        image: form.image.filter(|image| !image.is_empty()),
    };

    let mut errors = match changes.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    if pub_date.is_none() {
        errors.add("pub_date", REQUIRED);
    }
    if let Some(id) = changes.category_id {
        if state.categories.find_by_id(id).await?.is_none() {
            errors.add("category", INVALID_CHOICE);
        }
    }
    if let Some(id) = changes.location_id {
        if state.locations.find_by_id(id).await?.is_none() {
            errors.add("location", INVALID_CHOICE);
        }
    }
    errors.into_result()?;

    Ok(changes)
}

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
