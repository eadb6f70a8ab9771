//! Profile page and profile editing.

use actix_web::{HttpResponse, http::header, web};
use chrono::Utc;

use blogicum_core::domain::{PostQuery, ProfileChanges, User};
use blogicum_core::error::{DomainError, RepoError};
use blogicum_core::pagination::PageRequest;
use blogicum_core::policy::{ensure_can_edit_profile, sees_all_posts_of};
use blogicum_core::ports::BaseRepository;
use blogicum_core::validation::{Validate, ValidationErrors};
use blogicum_shared::dto::{PageQuery, ProfileForm, ProfileResponse};

use super::{present, profile_url};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(super) const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// GET /profile/{username}/ - the user and their posts.
///
/// The owner sees every post they wrote; everyone else only public ones.
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    viewer: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| DomainError::not_found("User", &username))?;

    let posts_query = if sees_all_posts_of(viewer.user_id(), &user) {
        PostQuery::all_by_author(user.id)
    } else {
        PostQuery::public(Utc::now()).by_author(user.id)
    };

    let page = PageRequest::new(query.into_inner().page);
    let posts = state.posts.list(posts_query, &page).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        profile: present::user(&user),
        page_obj: present::page_of_posts(&state, posts).await?,
    }))
}

/// GET /profile/{username}/edit/ - the owner's current details.
pub async fn edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = profile_owner(&state, &identity, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(present::account(&user)))
}

/// POST /profile/{username}/edit/
pub async fn edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ProfileForm>,
) -> AppResult<HttpResponse> {
    let user = profile_owner(&state, &identity, &path.into_inner()).await?;

    let form = body.into_inner();
    let changes = ProfileChanges {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        username: form.username,
    };
    changes.validate()?;

    if changes.username != user.username {
        if let Some(other) = state.users.find_by_username(&changes.username).await? {
            if other.id != user.id {
                return Err(ValidationErrors::single("username", USERNAME_TAKEN).into());
            }
        }
    }

    let user = state
        .users
        .update_profile(user.id, changes)
        .await
        .map_err(|err| match err {
            RepoError::Constraint(_) => {
                AppError::from(ValidationErrors::single("username", USERNAME_TAKEN))
            }
            other => AppError::from(other),
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "Profile updated");

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, profile_url(&user.username)))
        .json(present::account(&user)))
}

/// The current user, provided their username is the one in the URL.
async fn profile_owner(state: &AppState, identity: &Identity, username: &str) -> AppResult<User> {
    let current = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    ensure_can_edit_profile(Some(&current), username)?;
    Ok(current)
}
