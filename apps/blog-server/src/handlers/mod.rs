//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod categories;
mod comments;
mod health;
mod pages;
mod posts;
mod present;
mod profiles;

use actix_web::{HttpResponse, http::header, web};
use serde::de::DeserializeOwned;

use crate::middleware::error::{AppError, AppResult, json_error_handler, not_found};
use crate::middleware::rate_limit::RateLimitMiddleware;

pub(crate) fn post_url(id: i64) -> String {
    format!("/posts/{}/", id)
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

/// `303 See Other` to `location`.
pub(crate) fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Parse a JSON form taken as raw bytes, with the same 400 as a rejected `web::Json`.
pub(crate) fn parse_form<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        AppError::BadRequest(format!("Json deserialize error: {}", e))
    })
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/", web::get().to(posts::index))
        .route("/health/", web::get().to(health::health_check))
        // Posts; `create/` must win over `{id}`
        .service(
            web::resource("/posts/create/")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create)),
        )
        .service(
            web::resource("/posts/{id:\\d+}/")
                .route(web::get().to(posts::detail))
                .route(web::post().to(comments::add)),
        )
        .route("/posts/{id:\\d+}/comment/", web::post().to(comments::add))
        .service(
            web::resource("/posts/{id:\\d+}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit)),
        )
        .service(
            web::resource("/posts/{id:\\d+}/delete/")
                .route(web::get().to(posts::delete_form))
                .route(web::post().to(posts::delete)),
        )
        .service(
            web::resource("/posts/{post_id:\\d+}/edit_comment/{comment_id:\\d+}/")
                .route(web::get().to(comments::edit_form))
                .route(web::post().to(comments::edit)),
        )
        .service(
            web::resource("/posts/{post_id:\\d+}/delete_comment/{comment_id:\\d+}/")
                .route(web::get().to(comments::delete_form))
                .route(web::post().to(comments::delete)),
        )
        .route("/category/{slug}/", web::get().to(categories::category_posts))
        .route("/profile/{username}/", web::get().to(profiles::profile))
        .service(
            web::resource("/profile/{username}/edit/")
                .route(web::get().to(profiles::edit_form))
                .route(web::post().to(profiles::edit)),
        )
        .route("/about/", web::get().to(pages::about))
        .route("/rules/", web::get().to(pages::rules))
        // Staff
        .service(
            web::scope("/admin")
                .service(
                    web::resource("/pages/")
                        .route(web::get().to(admin::list_pages))
                        .route(web::post().to(admin::create_page)),
                )
                .route("/pages/{slug}/", web::post().to(admin::update_page))
                .service(
                    web::resource("/categories/")
                        .route(web::get().to(admin::list_categories))
                        .route(web::post().to(admin::create_category)),
                )
                .route(
                    "/categories/{id:\\d+}/",
                    web::post().to(admin::update_category),
                )
                .service(
                    web::resource("/locations/")
                        .route(web::get().to(admin::list_locations))
                        .route(web::post().to(admin::create_location)),
                )
                .route(
                    "/locations/{id:\\d+}/",
                    web::post().to(admin::update_location),
                ),
        )
        // Auth routes
        .service(
            web::scope("/auth")
                .wrap(RateLimitMiddleware)
                .route("/registration/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login))
                .route("/me/", web::get().to(auth::me)),
        )
        .default_service(web::to(not_found));
}
