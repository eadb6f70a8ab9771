//! # Blogicum server
//!
//! Actix-web application serving the blog: posts, comments, categories,
//! profiles, static pages and their staff administration.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;

pub use config::AppConfig;
pub use handlers::configure_routes;
pub use state::AppState;
