use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use blogicum_core::domain::{
    Category, CategoryFields, Comment, Location, LocationFields, NewComment, NewPost, NewUser,
    Page, PageFields, Post, PostChanges, PostListing, PostQuery, ProfileChanges, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{PageRequest, Paginated};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PageRepository,
    PostRepository, UserRepository,
};

use super::store::{InMemoryStore, Tables};

macro_rules! in_memory_repository {
    ($(#[$meta:meta])* $name:ident, $entity:ty, $table:ident, $delete:expr) => {
        $(#[$meta])*
        pub struct $name {
            store: Arc<InMemoryStore>,
        }

        impl $name {
            pub fn new(store: Arc<InMemoryStore>) -> Self {
                Self { store }
            }
        }

        #[async_trait]
        impl BaseRepository<$entity, i64> for $name {
            async fn find_by_id(&self, id: i64) -> Result<Option<$entity>, RepoError> {
                let tables = self.store.tables.read().await;
                Ok(tables.$table.rows.get(&id).cloned())
            }

            async fn delete(&self, id: i64) -> Result<(), RepoError> {
                let mut tables = self.store.tables.write().await;
                let delete: fn(&mut Tables, i64) -> bool = $delete;
                if delete(&mut tables, id) {
                    Ok(())
                } else {
                    Err(RepoError::NotFound)
                }
            }
        }
    };
}

in_memory_repository!(
    /// In-memory user repository.
    InMemoryUserRepository,
    User,
    users,
    |tables, id| tables.delete_user(id)
);

in_memory_repository!(
    /// In-memory category repository.
    InMemoryCategoryRepository,
    Category,
    categories,
    |tables, id| {
        let removed = tables.categories.rows.remove(&id).is_some();
        tables.detach_category(id);
        removed
    }
);

in_memory_repository!(
    /// In-memory location repository.
    InMemoryLocationRepository,
    Location,
    locations,
    |tables, id| {
        let removed = tables.locations.rows.remove(&id).is_some();
        tables.detach_location(id);
        removed
    }
);

in_memory_repository!(
    /// In-memory post repository.
    InMemoryPostRepository,
    Post,
    posts,
    |tables, id| tables.delete_post(id)
);

in_memory_repository!(
    /// In-memory comment repository.
    InMemoryCommentRepository,
    Comment,
    comments,
    |tables, id| tables.comments.rows.remove(&id).is_some()
);

in_memory_repository!(
    /// In-memory static page repository.
    InMemoryPageRepository,
    Page,
    pages,
    |tables, id| tables.pages.rows.remove(&id).is_some()
);

fn taken(what: &str) -> RepoError {
    RepoError::Constraint(format!("{what} already exists"))
}

fn collect_by_ids<T: Clone>(
    rows: &std::collections::BTreeMap<i64, T>,
    ids: &[i64],
) -> Vec<T> {
    ids.iter().filter_map(|id| rows.get(id).cloned()).collect()
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(collect_by_ids(&tables.users.rows, ids))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;
        let profile = new_user.profile;
        if tables
            .users
            .rows
            .values()
            .any(|u| u.username == profile.username)
        {
            return Err(taken("Username"));
        }

        let user = User {
            id: tables.users.next_id(),
            username: profile.username,
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            password_hash: new_user.password_hash,
            is_staff: new_user.is_staff,
            date_joined: Utc::now(),
        };
        tables.users.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables
            .users
            .rows
            .values()
            .any(|u| u.id != id && u.username == changes.username)
        {
            return Err(taken("Username"));
        }

        let user = tables.users.rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.username = changes.username;
        user.email = changes.email;
        user.first_name = changes.first_name;
        user.last_name = changes.last_name;
        Ok(user.clone())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .categories
            .rows
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(collect_by_ids(&tables.categories.rows, ids))
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.rows.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn create(&self, fields: CategoryFields) -> Result<Category, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables
            .categories
            .rows
            .values()
            .any(|c| c.slug == fields.slug)
        {
            return Err(taken("Category slug"));
        }

        let category = Category {
            id: tables.categories.next_id(),
            title: fields.title,
            description: fields.description,
            slug: fields.slug,
            is_published: fields.is_published,
            created_at: Utc::now(),
        };
        tables.categories.rows.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: i64, fields: CategoryFields) -> Result<Category, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables
            .categories
            .rows
            .values()
            .any(|c| c.id != id && c.slug == fields.slug)
        {
            return Err(taken("Category slug"));
        }

        let category = tables
            .categories
            .rows
            .get_mut(&id)
            .ok_or(RepoError::NotFound)?;
        category.title = fields.title;
        category.description = fields.description;
        category.slug = fields.slug;
        category.is_published = fields.is_published;
        Ok(category.clone())
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Location>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(collect_by_ids(&tables.locations.rows, ids))
    }

    async fn list(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut locations: Vec<Location> = tables.locations.rows.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn create(&self, fields: LocationFields) -> Result<Location, RepoError> {
        let mut tables = self.store.tables.write().await;
        let location = Location {
            id: tables.locations.next_id(),
            name: fields.name,
            is_published: fields.is_published,
            created_at: Utc::now(),
        };
        tables.locations.rows.insert(location.id, location.clone());
        Ok(location)
    }

    async fn update(&self, id: i64, fields: LocationFields) -> Result<Location, RepoError> {
        let mut tables = self.store.tables.write().await;
        let location = tables
            .locations
            .rows
            .get_mut(&id)
            .ok_or(RepoError::NotFound)?;
        location.name = fields.name;
        location.is_published = fields.is_published;
        Ok(location.clone())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.users.rows.contains_key(&new_post.author_id) {
            return Err(RepoError::Constraint("Unknown author".to_string()));
        }

        let fields = new_post.fields;
        let post = Post {
            id: tables.posts.next_id(),
            title: fields.title,
            text: fields.text,
            pub_date: fields.pub_date,
            author_id: new_post.author_id,
            category_id: fields.category_id,
            location_id: fields.location_id,
            image: fields.image,
            is_published: new_post.is_published,
            created_at: Utc::now(),
        };
        tables.posts.rows.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        let post = tables.posts.rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.title = changes.title;
        post.text = changes.text;
        post.pub_date = changes.pub_date;
        post.category_id = changes.category_id;
        post.location_id = changes.location_id;
        post.image = changes.image;
        Ok(post.clone())
    }

    async fn list(
        &self,
        query: PostQuery,
        page: &PageRequest,
    ) -> Result<Paginated<PostListing>, RepoError> {
        let tables = self.store.tables.read().await;

        let mut posts: Vec<&Post> = tables
            .posts
            .rows
            .values()
            .filter(|post| {
                let category = post
                    .category_id
                    .and_then(|id| tables.categories.rows.get(&id));
                query.matches(post, category)
            })
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        let mut counts: HashMap<i64, u64> = HashMap::new();
        for comment in tables.comments.rows.values() {
            *counts.entry(comment.post_id).or_default() += 1;
        }

        let listings = posts
            .into_iter()
            .map(|post| PostListing {
                post: post.clone(),
                comment_count: counts.get(&post.id).copied().unwrap_or(0),
            })
            .collect();

        Ok(Paginated::from_sorted(listings, page))
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.posts.rows.contains_key(&new_comment.post_id) {
            return Err(RepoError::Constraint("Unknown post".to_string()));
        }

        let comment = Comment {
            id: tables.comments.next_id(),
            text: new_comment.text,
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            created_at: Utc::now(),
        };
        tables.comments.rows.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .rows
            .values()
            .filter(|c| c.belongs_to(post_id))
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn find_on_post(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .comments
            .rows
            .get(&comment_id)
            .filter(|c| c.belongs_to(post_id))
            .cloned())
    }

    async fn update_text(&self, id: i64, text: String) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        let comment = tables.comments.rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        comment.text = text;
        Ok(comment.clone())
    }
}

#[async_trait]
impl PageRepository for InMemoryPageRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.pages.rows.values().find(|p| p.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Page>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut pages: Vec<Page> = tables.pages.rows.values().cloned().collect();
        pages.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(pages)
    }

    async fn create(&self, fields: PageFields) -> Result<Page, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables.pages.rows.values().any(|p| p.slug == fields.slug) {
            return Err(taken("Page slug"));
        }

        let page = Page {
            id: tables.pages.next_id(),
            slug: fields.slug,
            title: fields.title,
            content: fields.content,
            updated_at: Utc::now(),
        };
        tables.pages.rows.insert(page.id, page.clone());
        Ok(page)
    }

    async fn update(&self, slug: &str, fields: PageFields) -> Result<Page, RepoError> {
        let mut tables = self.store.tables.write().await;
        let id = tables
            .pages
            .rows
            .values()
            .find(|p| p.slug == slug)
            .map(|p| p.id)
            .ok_or(RepoError::NotFound)?;
        if tables
            .pages
            .rows
            .values()
            .any(|p| p.id != id && p.slug == fields.slug)
        {
            return Err(taken("Page slug"));
        }

        let page = tables.pages.rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        page.slug = fields.slug;
        page.title = fields.title;
        page.content = fields.content;
        page.updated_at = Utc::now();
        Ok(page.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    use blogicum_core::POSTS_PER_PAGE;
    use blogicum_core::ports::Repositories;

    async fn author(repos: &Repositories, username: &str) -> User {
        repos
            .users
            .create(NewUser {
                profile: ProfileChanges {
                    first_name: String::new(),
                    last_name: String::new(),
                    email: format!("{username}@example.com"),
                    username: username.to_string(),
                },
                password_hash: "hash".to_string(),
                is_staff: false,
            })
            .await
            .unwrap()
    }

    async fn category(repos: &Repositories, slug: &str, is_published: bool) -> Category {
        repos
            .categories
            .create(CategoryFields {
                title: slug.to_string(),
                description: "About".to_string(),
                slug: slug.to_string(),
                is_published,
            })
            .await
            .unwrap()
    }

    fn changes(title: &str, pub_date: DateTime<Utc>, category_id: Option<i64>) -> PostChanges {
        PostChanges {
            title: title.to_string(),
            text: "Body".to_string(),
            pub_date,
            category_id,
            location_id: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_public_listing_hides_drafts_and_paginates() {
        let repos = InMemoryStore::repositories();
        let now = Utc::now();
        let ada = author(&repos, "ada").await;
        let travel = category(&repos, "travel", true).await;
        let hidden = category(&repos, "hidden", false).await;

        for i in 0..12 {
            repos
                .posts
                .create(NewPost::new(
                    ada.id,
                    changes(&format!("p{i}"), now - Duration::hours(i), Some(travel.id)),
                ))
                .await
                .unwrap();
        }
        repos
            .posts
            .create(NewPost::new(ada.id, changes("future", now + Duration::days(1), Some(travel.id))))
            .await
            .unwrap();
        repos
            .posts
            .create(NewPost::new(ada.id, changes("hidden", now, Some(hidden.id))))
            .await
            .unwrap();
        repos
            .posts
            .create(NewPost::new(ada.id, changes("unfiled", now, None)))
            .await
            .unwrap();

        let first = repos
            .posts
            .list(PostQuery::public(now), &PageRequest::first())
            .await
            .unwrap();
        assert_eq!(first.window.total, 12);
        assert_eq!(first.items.len(), POSTS_PER_PAGE as usize);
        assert_eq!(first.items[0].post.title, "p0");
        assert!(
            first
                .items
                .windows(2)
                .all(|w| w[0].post.pub_date >= w[1].post.pub_date)
        );

        let second = repos
            .posts
            .list(PostQuery::public(now), &PageRequest::new(Some("2".to_string())))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);

        let own = repos
            .posts
            .list(PostQuery::all_by_author(ada.id), &PageRequest::first().with_per_page(100))
            .await
            .unwrap();
        assert_eq!(own.window.total, 15);
    }

    #[tokio::test]
    async fn test_comment_update_keeps_post_and_author() {
        let repos = InMemoryStore::repositories();
        let ada = author(&repos, "ada").await;
        let grace = author(&repos, "grace").await;
        let post = repos
            .posts
            .create(NewPost::new(ada.id, changes("p", Utc::now(), None)))
            .await
            .unwrap();

        let comment = repos
            .comments
            .create(NewComment {
                post_id: post.id,
                author_id: grace.id,
                text: "First".to_string(),
            })
            .await
            .unwrap();

        let updated = repos
            .comments
            .update_text(comment.id, "Edited".to_string())
            .await
            .unwrap();
        assert_eq!(updated.text, "Edited");
        assert_eq!(updated.post_id, post.id);
        assert_eq!(updated.author_id, grace.id);

        assert!(
            repos
                .comments
                .find_on_post(post.id + 1, comment.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_listing_counts_comments() {
        let repos = InMemoryStore::repositories();
        let now = Utc::now();
        let ada = author(&repos, "ada").await;
        let travel = category(&repos, "travel", true).await;
        let post = repos
            .posts
            .create(NewPost::new(ada.id, changes("p", now - Duration::minutes(1), Some(travel.id))))
            .await
            .unwrap();
        for text in ["a", "b"] {
            repos
                .comments
                .create(NewComment {
                    post_id: post.id,
                    author_id: ada.id,
                    text: text.to_string(),
                })
                .await
                .unwrap();
        }

        let page = repos
            .posts
            .list(PostQuery::public(now), &PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.items[0].comment_count, 2);
    }

    #[tokio::test]
    async fn test_deleting_post_removes_its_comments() {
        let repos = InMemoryStore::repositories();
        let ada = author(&repos, "ada").await;
        let post = repos
            .posts
            .create(NewPost::new(ada.id, changes("p", Utc::now(), None)))
            .await
            .unwrap();
        repos
            .comments
            .create(NewComment {
                post_id: post.id,
                author_id: ada.id,
                text: "bye".to_string(),
            })
            .await
            .unwrap();

        repos.posts.delete(post.id).await.unwrap();

        assert!(repos.comments.list_for_post(post.id).await.unwrap().is_empty());
        assert!(matches!(
            repos.posts.delete(post.id).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_usernames_are_unique() {
        let repos = InMemoryStore::repositories();
        let ada = author(&repos, "ada").await;
        author(&repos, "grace").await;

        let result = repos
            .users
            .update_profile(
                ada.id,
                ProfileChanges {
                    first_name: String::new(),
                    last_name: String::new(),
                    email: String::new(),
                    username: "grace".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_page_update_stamps_updated_at() {
        let repos = InMemoryStore::repositories();
        let page = repos
            .pages
            .create(PageFields::new(None, "About".to_string(), "v1".to_string()))
            .await
            .unwrap();

        let updated = repos
            .pages
            .update(
                "about",
                PageFields::new(Some("about".to_string()), "About".to_string(), "v2".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(updated.id, page.id);
        assert_eq!(updated.content, "v2");
        assert!(updated.updated_at >= page.updated_at);
    }
}
