//! Domain records to response DTOs.

use std::collections::HashMap;

use blogicum_core::domain::{Category, Comment, Location, Page, PostListing, User};
use blogicum_core::pagination::Paginated;
use blogicum_shared::PaginatedResponse;
use blogicum_shared::dto::{
    AccountResponse, CategoryResponse, CommentResponse, LocationResponse, PostResponse,
    StaticPageResponse, UserResponse,
};

use crate::middleware::error::AppResult;
use crate::state::AppState;

pub fn category(category: &Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title.clone(),
        description: category.description.clone(),
        slug: category.slug.clone(),
        is_published: category.is_published,
    }
}

pub fn location(location: &Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name.clone(),
        is_published: location.is_published,
    }
}

pub fn user(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        date_joined: user.date_joined,
    }
}

pub fn account(user: &User) -> AccountResponse {
    AccountResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_staff: user.is_staff,
    }
}

pub fn page(page: &Page) -> StaticPageResponse {
    StaticPageResponse {
        slug: page.slug.clone(),
        title: page.title.clone(),
        content: page.content.clone(),
        updated_at: page.updated_at,
    }
}

fn unique(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut ids: Vec<i64> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Resolve authors, categories and locations of `listings` in one lookup each.
pub async fn posts(state: &AppState, listings: Vec<PostListing>) -> AppResult<Vec<PostResponse>> {
    let author_ids = unique(listings.iter().map(|l| l.post.author_id));
    let category_ids = unique(listings.iter().filter_map(|l| l.post.category_id));
    let location_ids = unique(listings.iter().filter_map(|l| l.post.location_id));

    let authors: HashMap<i64, String> = state
        .users
        .find_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();
    let categories: HashMap<i64, Category> = state
        .categories
        .find_by_ids(&category_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let locations: HashMap<i64, Location> = state
        .locations
        .find_by_ids(&location_ids)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();

    Ok(listings
        .into_iter()
        .map(|PostListing { post, comment_count }| PostResponse {
            id: post.id,
            title: post.title,
            text: post.text,
            pub_date: post.pub_date,
            author: authors.get(&post.author_id).cloned().unwrap_or_default(),
            category: post
                .category_id
                .and_then(|id| categories.get(&id))
                .map(category),
            location: post
                .location_id
                .and_then(|id| locations.get(&id))
                .map(location),
            image: post.image,
            is_published: post.is_published,
            comment_count,
        })
        .collect())
}

/// One page of posts in its JSON form.
pub async fn page_of_posts(
    state: &AppState,
    page: Paginated<PostListing>,
) -> AppResult<PaginatedResponse<PostResponse>> {
    let window = page.window;
    Ok(PaginatedResponse {
        items: posts(state, page.items).await?,
        page: window.number,
        num_pages: window.num_pages,
        per_page: window.per_page,
        total: window.total,
        has_next: window.has_next(),
        has_previous: window.has_previous(),
    })
}

pub async fn comments(state: &AppState, comments: Vec<Comment>) -> AppResult<Vec<CommentResponse>> {
    let author_ids = unique(comments.iter().map(|c| c.author_id));
    let authors: HashMap<i64, String> = state
        .users
        .find_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    Ok(comments
        .into_iter()
        .map(|comment| CommentResponse {
            id: comment.id,
            post_id: comment.post_id,
            author: authors.get(&comment.author_id).cloned().unwrap_or_default(),
            text: comment.text,
            created_at: comment.created_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_sorts_and_dedups() {
        assert_eq!(unique([3, 1, 3, 2, 1].into_iter()), vec![1, 2, 3]);
    }
}
