//! Domain entities - the blog's records and the rules attached to them.

mod category;
mod comment;
mod location;
mod page;
mod post;
mod user;

pub use category::{CATEGORY_SLUG_MAX, CATEGORY_TITLE_MAX, Category, CategoryFields};
pub use comment::{Comment, CommentText, NewComment};
pub use location::{LOCATION_NAME_MAX, Location, LocationFields};
pub use page::{PAGE_SLUG_MAX, PAGE_TITLE_MAX, Page, PageFields};
pub use post::{
    NewPost, POST_IMAGE_MAX, POST_TITLE_MAX, Post, PostChanges, PostListing, PostQuery,
    PostVisibility,
};
pub use user::{NAME_MAX, NewUser, PASSWORD_MIN, ProfileChanges, Registration, USERNAME_MAX, User};
