use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use blogicum_core::domain::{Category, Comment, Location, Page, Post, User};
use blogicum_core::ports::Repositories;

use super::repos::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryLocationRepository,
    InMemoryPageRepository, InMemoryPostRepository, InMemoryUserRepository,
};

/// Rows keyed by id plus the id sequence.
pub(crate) struct Table<T> {
    pub(crate) rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    pub(crate) fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub(crate) struct Tables {
    pub(crate) users: Table<User>,
    pub(crate) categories: Table<Category>,
    pub(crate) locations: Table<Location>,
    pub(crate) posts: Table<Post>,
    pub(crate) comments: Table<Comment>,
    pub(crate) pages: Table<Page>,
}

impl Tables {
    /// Deleting a post takes its comments with it, like the foreign-key cascade.
    pub(crate) fn delete_post(&mut self, id: i64) -> bool {
        let removed = self.posts.rows.remove(&id).is_some();
        if removed {
            self.comments.rows.retain(|_, c| c.post_id != id);
        }
        removed
    }

    /// Deleting a category or location leaves its posts unfiled.
    pub(crate) fn detach_category(&mut self, id: i64) {
        for post in self.posts.rows.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
    }

    pub(crate) fn detach_location(&mut self, id: i64) {
        for post in self.posts.rows.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
    }

    /// Deleting a user removes everything they wrote.
    pub(crate) fn delete_user(&mut self, id: i64) -> bool {
        let removed = self.users.rows.remove(&id).is_some();
        if removed {
            let post_ids: Vec<i64> = self
                .posts
                .rows
                .values()
                .filter(|p| p.author_id == id)
                .map(|p| p.id)
                .collect();
            for post_id in post_ids {
                self.delete_post(post_id);
            }
            self.comments.rows.retain(|_, c| c.author_id != id);
        }
        removed
    }
}

/// Shared in-memory database behind an async RwLock.
#[derive(Default)]
pub struct InMemoryStore {
    pub(crate) tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repositories over a fresh, empty store.
    pub fn repositories() -> Repositories {
        Arc::new(Self::new()).into_repositories()
    }

    /// Repositories sharing this store.
    pub fn into_repositories(self: Arc<Self>) -> Repositories {
        Repositories {
            users: Arc::new(InMemoryUserRepository::new(self.clone())),
            categories: Arc::new(InMemoryCategoryRepository::new(self.clone())),
            locations: Arc::new(InMemoryLocationRepository::new(self.clone())),
            posts: Arc::new(InMemoryPostRepository::new(self.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(self.clone())),
            pages: Arc::new(InMemoryPageRepository::new(self)),
        }
    }
}
