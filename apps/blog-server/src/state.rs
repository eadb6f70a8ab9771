//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::domain::{NewUser, ProfileChanges};
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PageRepository, PasswordService,
    PostRepository, RateLimiter, Repositories, TokenService, UserRepository,
};
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService};

use crate::config::AppConfig;
use crate::middleware::error::AppResult;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    /// Throttles the auth endpoints when set.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    /// Rate-limit clients by forwarding headers rather than the socket peer.
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn from_parts(
        repos: Repositories,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            users: repos.users,
            categories: repos.categories,
            locations: repos.locations,
            posts: repos.posts,
            comments: repos.comments,
            pages: repos.pages,
            tokens,
            passwords,
            rate_limiter: None,
            trust_proxy_headers: false,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_trusted_proxy(mut self, trust_proxy_headers: bool) -> Self {
        self.trust_proxy_headers = trust_proxy_headers;
        self
    }

    /// Create the staff accounts in `usernames` that do not exist yet.
    ///
    /// An existing account is never promoted, so a name claimed through
    /// registration stays an ordinary user. Returns how many were created.
    pub async fn seed_staff(&self, usernames: &[String], password: &str) -> AppResult<usize> {
        let mut created = 0;

        for username in usernames {
            if let Some(existing) = self.users.find_by_username(username).await? {
                if !existing.is_staff {
                    tracing::warn!(
                        username = %username,
                        "Staff username belongs to an ordinary account; leaving it unchanged"
                    );
                }
                continue;
            }

            let user = self
                .users
                .create(NewUser {
                    profile: ProfileChanges {
                        first_name: String::new(),
                        last_name: String::new(),
                        email: String::new(),
                        username: username.clone(),
                    },
                    password_hash: self.passwords.hash(password)?,
                    is_staff: true,
                })
                .await?;

            tracing::info!(user_id = user.id, username = %user.username, "Staff account created");
            created += 1;
        }

        Ok(created)
    }

    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;

        let state = Self::from_parts(
            repos,
            Arc::new(JwtTokenService::new(config.jwt.clone())),
            Arc::new(Argon2PasswordService::new()),
        )
        .with_trusted_proxy(config.trust_proxy_headers);

        match (&config.admin_password, config.admin_usernames.is_empty()) {
            (_, true) => {}
            (Some(password), false) => {
                if let Err(e) = state.seed_staff(&config.admin_usernames, password).await {
                    tracing::error!("Failed to seed staff accounts: {}", e);
                }
            }
            (None, false) => {
                tracing::warn!("ADMIN_USERNAMES is set without ADMIN_PASSWORD; no staff accounts seeded");
            }
        }

        #[cfg(feature = "rate-limit")]
        let state = state.with_rate_limiter(Arc::new(blogicum_infra::InMemoryRateLimiter::new(
            config.rate_limit.clone(),
        )));

        tracing::info!("Application state initialized");
        state
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return InMemoryStore::repositories();
        };

        match blogicum_infra::connect(db_config).await {
            Ok(db) => blogicum_infra::postgres_repositories(db),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                InMemoryStore::repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        InMemoryStore::repositories()
    }
}
