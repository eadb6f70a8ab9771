//! Authentication handlers.

use actix_web::{HttpResponse, web};

use blogicum_core::domain::{NewUser, ProfileChanges, Registration, User};
use blogicum_core::error::{DomainError, RepoError};
use blogicum_core::ports::{AuthError, BaseRepository};
use blogicum_core::validation::{Validate, ValidationErrors};
use blogicum_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::present;
use super::profiles::USERNAME_TAKEN;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let registration = Registration {
        profile: ProfileChanges {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            username: req.username,
        },
        password: req.password,
    };
    registration.validate()?;

    let username_taken = || -> AppError {
        ValidationErrors::single("username", USERNAME_TAKEN).into()
    };

    if state
        .users
        .find_by_username(&registration.profile.username)
        .await?
        .is_some()
    {
        return Err(username_taken());
    }

    let password_hash = state.passwords.hash(&registration.password)?;

    let user = state
        .users
        .create(NewUser {
            profile: registration.profile,
            password_hash,
            is_staff: false,
        })
        .await
        .map_err(|err| match err {
            RepoError::Constraint(_) => username_taken(),
            other => AppError::from(other),
        })?;

    tracing::info!(
        user_id = user.id,
        username = %user.username,
        email = %mask_email(&user.email),
        "User registered"
    );

    Ok(HttpResponse::Created().json(issue_token(&state, &user)?))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let Some(user) = state.users.find_by_username(&req.username).await? else {
        tracing::debug!(username = %req.username, "Login for unknown user");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::debug!(username = %req.username, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, &user)?))
}

/// GET /auth/me/ - Protected route
pub async fn me(identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    Ok(HttpResponse::Ok().json(present::account(&user)))
}

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.roles())?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

/// Keep the first character of the local part, e.g. `a***@example.com`.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("ada@example.com"), "a***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
