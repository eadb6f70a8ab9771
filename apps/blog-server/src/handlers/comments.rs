//! Comment handlers.

use actix_web::{HttpResponse, http::header, web};

use blogicum_core::domain::{Comment, CommentText, NewComment};
use blogicum_core::error::DomainError;
use blogicum_core::policy::ensure_can_manage_comment;
use blogicum_core::ports::BaseRepository;
use blogicum_core::validation::Validate;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{CommentForm, CommentResponse};

use super::posts::visible_post;
use super::{post_url, present};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /posts/{id}/ and POST /posts/{id}/comment/
pub async fn add(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let post = visible_post(&state, path.into_inner(), Some(identity.user_id)).await?;

    let text = CommentText(body.into_inner().text);
    text.validate()?;

    let comment = state
        .comments
        .create(NewComment {
            post_id: post.id,
            author_id: identity.user_id,
            text: text.0,
        })
        .await?;

    tracing::info!(post_id = post.id, comment_id = comment.id, "Comment added");

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, post_url(post.id)))
        .json(one_comment(&state, comment).await?))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = own_comment(&state, post_id, comment_id, &identity).await?;

    Ok(HttpResponse::Ok().json(one_comment(&state, comment).await?))
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = own_comment(&state, post_id, comment_id, &identity).await?;

    let text = CommentText(body.into_inner().text);
    text.validate()?;

    let comment = state.comments.update_text(comment.id, text.0).await?;
    tracing::info!(post_id, comment_id, "Comment updated");

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, post_url(post_id)))
        .json(one_comment(&state, comment).await?))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/ - the comment, for confirmation.
pub async fn delete_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    edit_form(identity, state, path).await
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = own_comment(&state, post_id, comment_id, &identity).await?;

    state.comments.delete(comment.id).await?;
    tracing::info!(post_id, comment_id, "Comment deleted");

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, post_url(post_id)))
        .json(ApiResponse::<()>::message("Comment deleted")))
}

/// The comment under `post_id`, if `identity` wrote it.
async fn own_comment(
    state: &AppState,
    post_id: i64,
    comment_id: i64,
    identity: &Identity,
) -> AppResult<Comment> {
    let comment = state
        .comments
        .find_on_post(post_id, comment_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;

    ensure_can_manage_comment(Some(identity.user_id), &comment)?;
    Ok(comment)
}

async fn one_comment(state: &AppState, comment: Comment) -> AppResult<CommentResponse> {
    present::comments(state, vec![comment])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Internal("comment lost while rendering".to_string()).into())
}
