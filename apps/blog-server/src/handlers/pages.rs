//! Static informational pages.

use actix_web::{HttpResponse, web};

use blogicum_core::error::DomainError;

use super::present;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /about/
pub async fn about(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    static_page(&state, "about").await
}

/// GET /rules/
pub async fn rules(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    static_page(&state, "rules").await
}

async fn static_page(state: &AppState, slug: &str) -> AppResult<HttpResponse> {
    let page = state
        .pages
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| DomainError::not_found("Page", slug))?;

    Ok(HttpResponse::Ok().json(present::page(&page)))
}
