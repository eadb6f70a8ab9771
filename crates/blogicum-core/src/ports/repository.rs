use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    Category, CategoryFields, Comment, Location, LocationFields, NewComment, NewPost, NewUser,
    Page, PageFields, Post, PostChanges, PostListing, PostQuery, ProfileChanges, User,
};
use crate::error::RepoError;
use crate::pagination::{PageRequest, Paginated};

/// Generic repository trait with the operations every record supports.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i64> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, RepoError>;

    /// Insert a user. Fails with `Constraint` when the username is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    /// Overwrite the profile fields. Fails with `Constraint` when the new username is taken.
    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<User, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, i64> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, RepoError>;

    /// All categories, ordered by title.
    async fn list(&self) -> Result<Vec<Category>, RepoError>;

    async fn create(&self, fields: CategoryFields) -> Result<Category, RepoError>;

    async fn update(&self, id: i64, fields: CategoryFields) -> Result<Category, RepoError>;
}

/// Location repository.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, i64> {
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Location>, RepoError>;

    /// All locations, ordered by name.
    async fn list(&self) -> Result<Vec<Location>, RepoError>;

    async fn create(&self, fields: LocationFields) -> Result<Location, RepoError>;

    async fn update(&self, id: i64, fields: LocationFields) -> Result<Location, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Overwrite the editable fields. Author and publish flag are left alone.
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError>;

    /// One page of posts matching `query`, newest `pub_date` first,
    /// each annotated with its comment count.
    async fn list(
        &self,
        query: PostQuery,
        page: &PageRequest,
    ) -> Result<Paginated<PostListing>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, i64> {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError>;

    /// A comment, only if it belongs to `post_id`.
    async fn find_on_post(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, RepoError>;

    /// Replace the text. Post and author are never written.
    async fn update_text(&self, id: i64, text: String) -> Result<Comment, RepoError>;
}

/// Static page repository.
#[async_trait]
pub trait PageRepository: BaseRepository<Page, i64> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, RepoError>;

    /// All pages, ordered by title.
    async fn list(&self) -> Result<Vec<Page>, RepoError>;

    async fn create(&self, fields: PageFields) -> Result<Page, RepoError>;

    /// Overwrite the page stored under `slug`, stamping `updated_at`.
    async fn update(&self, slug: &str, fields: PageFields) -> Result<Page, RepoError>;
}

/// Every repository the application needs, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub pages: Arc<dyn PageRepository>,
}
