//! PostgreSQL repository implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, FromQueryResult, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Unchanged,
};

use blogicum_core::domain::{
    Category, CategoryFields, Comment, Location, LocationFields, NewComment, NewPost, NewUser,
    Page, PageFields, Post, PostChanges, PostListing, PostQuery, PostVisibility, ProfileChanges,
    User,
};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{PageRequest, PageWindow, Paginated};
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PageRepository, PostRepository,
    Repositories, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::page::{self, Entity as PageEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;
pub type PostgresPageRepository = PostgresBaseRepository<PageEntity>;

/// All repositories sharing one connection pool.
pub fn postgres_repositories(db: DbConn) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
        locations: Arc::new(PostgresLocationRepository::new(db.clone())),
        posts: Arc::new(PostgresPostRepository::new(db.clone())),
        comments: Arc::new(PostgresCommentRepository::new(db.clone())),
        pages: Arc::new(PostgresPageRepository::new(db)),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let profile = new_user.profile;
        let model = user::ActiveModel {
            id: NotSet,
            username: Set(profile.username),
            email: Set(profile.email),
            first_name: Set(profile.first_name),
            last_name: Set(profile.last_name),
            password_hash: Set(new_user.password_hash),
            is_staff: Set(new_user.is_staff),
            date_joined: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<User, RepoError> {
        let model = user::ActiveModel {
            id: Unchanged(id),
            username: Set(changes.username),
            email: Set(changes.email),
            first_name: Set(changes.first_name),
            last_name: Set(changes.last_name),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = CategoryEntity::find()
            .filter(category::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, fields: CategoryFields) -> Result<Category, RepoError> {
        let model = category::ActiveModel {
            id: NotSet,
            title: Set(fields.title),
            description: Set(fields.description),
            slug: Set(fields.slug),
            is_published: Set(fields.is_published),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(&self, id: i64, fields: CategoryFields) -> Result<Category, RepoError> {
        let model = category::ActiveModel {
            id: Unchanged(id),
            title: Set(fields.title),
            description: Set(fields.description),
            slug: Set(fields.slug),
            is_published: Set(fields.is_published),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Location>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = LocationEntity::find()
            .filter(location::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, fields: LocationFields) -> Result<Location, RepoError> {
        let model = location::ActiveModel {
            id: NotSet,
            name: Set(fields.name),
            is_published: Set(fields.is_published),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(&self, id: i64, fields: LocationFields) -> Result<Location, RepoError> {
        let model = location::ActiveModel {
            id: Unchanged(id),
            name: Set(fields.name),
            is_published: Set(fields.is_published),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }
}

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: i64,
    comment_count: i64,
}

impl PostgresPostRepository {
    /// Comment counts for a set of posts; posts without comments are absent.
    async fn comment_counts(&self, post_ids: Vec<i64>) -> Result<HashMap<i64, u64>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_model::<CommentCount>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.post_id, row.comment_count.max(0) as u64))
            .collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let fields = new_post.fields;
        let model = post::ActiveModel {
            id: NotSet,
            title: Set(fields.title),
            text: Set(fields.text),
            pub_date: Set(fields.pub_date.into()),
            author_id: Set(new_post.author_id),
            category_id: Set(fields.category_id),
            location_id: Set(fields.location_id),
            image: Set(fields.image),
            is_published: Set(new_post.is_published),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let model = post::ActiveModel {
            id: Unchanged(id),
            title: Set(changes.title),
            text: Set(changes.text),
            pub_date: Set(changes.pub_date.into()),
            category_id: Set(changes.category_id),
            location_id: Set(changes.location_id),
            image: Set(changes.image),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn list(
        &self,
        query: PostQuery,
        page: &PageRequest,
    ) -> Result<Paginated<PostListing>, RepoError> {
        let mut select = PostEntity::find();

        if let PostVisibility::Public { now } = query.visibility {
            select = select
                .inner_join(CategoryEntity)
                .filter(post::Column::IsPublished.eq(true))
                .filter(post::Column::PubDate.lte(now))
                .filter(category::Column::IsPublished.eq(true));
        }
        if let Some(category_id) = query.category_id {
            select = select.filter(post::Column::CategoryId.eq(category_id));
        }
        if let Some(author_id) = query.author_id {
            select = select.filter(post::Column::AuthorId.eq(author_id));
        }

        let paginator = select
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, page.per_page);

        let total = paginator.num_items().await.map_err(map_db_err)?;
        let window = PageWindow::resolve(total, page);
        let models = paginator
            .fetch_page(window.index())
            .await
            .map_err(map_db_err)?;

        let counts = self
            .comment_counts(models.iter().map(|m| m.id).collect())
            .await?;

        let items = models
            .into_iter()
            .map(|model| {
                let comment_count = counts.get(&model.id).copied().unwrap_or(0);
                PostListing {
                    post: model.into(),
                    comment_count,
                }
            })
            .collect();

        Ok(Paginated { items, window })
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel {
            id: NotSet,
            text: Set(new_comment.text),
            post_id: Set(new_comment.post_id),
            author_id: Set(new_comment.author_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_on_post(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, RepoError> {
        let result = CommentEntity::find_by_id(comment_id)
            .filter(comment::Column::PostId.eq(post_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn update_text(&self, id: i64, text: String) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel {
            id: Unchanged(id),
            text: Set(text),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }
}

#[async_trait]
impl PageRepository for PostgresPageRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, RepoError> {
        let result = PageEntity::find()
            .filter(page::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Page>, RepoError> {
        let result = PageEntity::find()
            .order_by_asc(page::Column::Title)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, fields: PageFields) -> Result<Page, RepoError> {
        let model = page::ActiveModel {
            id: NotSet,
            slug: Set(fields.slug),
            title: Set(fields.title),
            content: Set(fields.content),
            updated_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(&self, slug: &str, fields: PageFields) -> Result<Page, RepoError> {
        let existing = PageEntity::find()
            .filter(page::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let model = page::ActiveModel {
            id: Unchanged(existing.id),
            slug: Set(fields.slug),
            title: Set(fields.title),
            content: Set(fields.content),
            updated_at: Set(Utc::now().into()),
        }
        .update(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }
}
