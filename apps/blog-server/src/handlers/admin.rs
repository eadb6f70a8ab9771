//! Staff-only management of static pages, categories and locations.

use actix_web::{HttpResponse, http::header, web};

use blogicum_core::domain::{CategoryFields, LocationFields, PageFields};
use blogicum_core::error::{DomainError, RepoError};
use blogicum_core::validation::Validate;
use blogicum_shared::dto::{CategoryForm, LocationForm, PageForm, StaticPageResponse};

use super::present;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const ADMIN: &str = "admin";

/// GET /admin/pages/
pub async fn list_pages(identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let pages: Vec<StaticPageResponse> =
        state.pages.list().await?.iter().map(present::page).collect();
    Ok(HttpResponse::Ok().json(pages))
}

/// POST /admin/pages/ - the slug is derived from the title when omitted.
pub async fn create_page(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<PageForm>,
) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let fields = page_fields(body.into_inner())?;
    let slug = fields.slug.clone();
    let page = state
        .pages
        .create(fields)
        .await
        .map_err(|err| slug_in_use(err, &slug))?;

    tracing::info!(slug = %page.slug, by = %identity.username, "Page created");

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/admin/pages/{}/", page.slug)))
        .json(present::page(&page)))
}

/// POST /admin/pages/{slug}/
pub async fn update_page(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PageForm>,
) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let fields = page_fields(body.into_inner())?;
    let slug = fields.slug.clone();
    let page = state
        .pages
        .update(&path.into_inner(), fields)
        .await
        .map_err(|err| slug_in_use(err, &slug))?;

    tracing::info!(slug = %page.slug, by = %identity.username, "Page updated");

    Ok(HttpResponse::Ok().json(present::page(&page)))
}

/// Unique-slug violations become a 409 naming the slug.
fn slug_in_use(err: RepoError, slug: &str) -> AppError {
    match err {
        RepoError::Constraint(_) => {
            DomainError::Duplicate(format!("The slug \"{}\" is already in use", slug)).into()
        }
        other => other.into(),
    }
}

fn page_fields(form: PageForm) -> AppResult<PageFields> {
    let fields = PageFields::new(form.slug, form.title, form.content);
    fields.validate()?;
    Ok(fields)
}

/// GET /admin/categories/
pub async fn list_categories(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let categories = state.categories.list().await?;
    Ok(HttpResponse::Ok().json(categories.iter().map(present::category).collect::<Vec<_>>()))
}

/// POST /admin/categories/
pub async fn create_category(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<CategoryForm>,
) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let fields = category_fields(body.into_inner())?;
    let slug = fields.slug.clone();
    let category = state
        .categories
        .create(fields)
        .await
        .map_err(|err| slug_in_use(err, &slug))?;

    tracing::info!(category_id = category.id, slug = %category.slug, "Category created");

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/category/{}/", category.slug)))
        .json(present::category(&category)))
}

/// POST /admin/categories/{id}/
pub async fn update_category(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CategoryForm>,
) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let fields = category_fields(body.into_inner())?;
    let slug = fields.slug.clone();
    let category = state
        .categories
        .update(path.into_inner(), fields)
        .await
        .map_err(|err| slug_in_use(err, &slug))?;

    tracing::info!(category_id = category.id, published = category.is_published, "Category updated");

    Ok(HttpResponse::Ok().json(present::category(&category)))
}

fn category_fields(form: CategoryForm) -> AppResult<CategoryFields> {
    let fields = CategoryFields {
        title: form.title,
        description: form.description,
        slug: form.slug,
        is_published: form.is_published,
    };
    fields.validate()?;
    Ok(fields)
}

/// GET /admin/locations/
pub async fn list_locations(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let locations = state.locations.list().await?;
    Ok(HttpResponse::Ok().json(locations.iter().map(present::location).collect::<Vec<_>>()))
}

/// POST /admin/locations/
pub async fn create_location(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<LocationForm>,
) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let fields = location_fields(body.into_inner())?;
    let location = state.locations.create(fields).await?;

    tracing::info!(location_id = location.id, "Location created");

    Ok(HttpResponse::Created().json(present::location(&location)))
}

/// POST /admin/locations/{id}/
pub async fn update_location(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<LocationForm>,
) -> AppResult<HttpResponse> {
    identity.require_role(ADMIN)?;

    let fields = location_fields(body.into_inner())?;
    let location = state.locations.update(path.into_inner(), fields).await?;

    Ok(HttpResponse::Ok().json(present::location(&location)))
}

fn location_fields(form: LocationForm) -> AppResult<LocationFields> {
    let fields = LocationFields {
        name: form.name,
        is_published: form.is_published,
    };
    fields.validate()?;
    Ok(fields)
}
