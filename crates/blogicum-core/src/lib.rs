//! # Blogicum Core
//!
//! The domain layer of the blog.
//! Records, visibility and permission rules, pagination and form validation,
//! plus the ports infrastructure has to implement. No infrastructure
//! dependencies live here.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod validation;

pub use error::{DomainError, RepoError};
pub use pagination::{PageRequest, PageWindow, Paginated, POSTS_PER_PAGE};
pub use validation::{FieldError, Validate, ValidationErrors};
