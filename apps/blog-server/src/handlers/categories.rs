//! Category page.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::domain::PostQuery;
use blogicum_core::error::DomainError;
use blogicum_core::pagination::PageRequest;
use blogicum_shared::dto::{CategoryPostsResponse, PageQuery};

use super::present;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /category/{slug}/ - public posts of a published category.
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|category| category.is_published)
        .ok_or_else(|| DomainError::not_found("Category", &slug))?;

    let page = PageRequest::new(query.into_inner().page);
    let posts = state
        .posts
        .list(PostQuery::public(Utc::now()).in_category(category.id), &page)
        .await?;

    Ok(HttpResponse::Ok().json(CategoryPostsResponse {
        category: present::category(&category),
        page_obj: present::page_of_posts(&state, posts).await?,
    }))
}
