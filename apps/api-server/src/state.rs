//! Application state - shared across all handlers.

use std::sync::Arc;

use agora_core::ports::{
    MailSender, MediaStore, NotificationRepository, PasswordService, PostRepository,
    TokenService, UserRepository,
};
use agora_core::services::{AccountService, EngagementService, Notifier, PostService};
use agora_infra::database::DatabaseConnections;
use agora_infra::{
    Argon2PasswordService, InMemoryNotificationRepository, InMemoryPostRepository,
    InMemoryUserRepository, JwtTokenService, LocalMediaStore, LogMailSender, WebhookMailSender,
};

#[cfg(feature = "postgres")]
use agora_infra::{
    PostgresNotificationRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::AppConfig;

/// The document store behind the services.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(connections: &DatabaseConnections) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(connections.main.clone())),
            posts: Arc::new(PostgresPostRepository::new(connections.main.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(
                connections.main.clone(),
            )),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub engagement: Arc<EngagementService>,
    pub posts: Arc<PostService>,
    pub notifier: Arc<Notifier>,
    pub tokens: Arc<dyn TokenService>,
    /// The same store the services upload into, kept concrete for serving.
    pub media_files: Arc<LocalMediaStore>,
    pub config: Arc<AppConfig>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: AppConfig) -> Self {
        let (db, repositories) = Self::connect(&config).await;

        let mail: Arc<dyn MailSender> = match &config.mail {
            Some(mail) => {
                tracing::info!(url = %mail.url, "Mail delivery via HTTP API");
                Arc::new(WebhookMailSender::new(mail.clone()))
            }
            None => {
                tracing::warn!("MAIL_API_URL not set. Mail will only be logged.");
                Arc::new(LogMailSender)
            }
        };

        let state = Self::from_parts(
            config,
            repositories,
            Arc::new(Argon2PasswordService::new()),
            mail,
        );

        tracing::info!("Application state initialized");
        Self { db, ..state }
    }

    #[cfg(feature = "postgres")]
    async fn connect(config: &AppConfig) -> (Option<Arc<DatabaseConnections>>, Repositories) {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return (None, Repositories::in_memory());
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => {
                let repositories = Repositories::postgres(&connections);
                (Some(Arc::new(connections)), repositories)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                (None, Repositories::in_memory())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect(_config: &AppConfig) -> (Option<Arc<DatabaseConnections>>, Repositories) {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        (None, Repositories::in_memory())
    }

    /// Wire services over the given stores. The media store is always the
    /// local one configured in `config.media`.
    pub fn from_parts(
        config: AppConfig,
        repositories: Repositories,
        passwords: Arc<dyn PasswordService>,
        mail: Arc<dyn MailSender>,
    ) -> Self {
        let Repositories {
            users,
            posts,
            notifications,
        } = repositories;

        let media_files = Arc::new(LocalMediaStore::new(
            config.media.root.clone(),
            config.media.base_url.clone(),
        ));
        let media: Arc<dyn MediaStore> = media_files.clone();

        let notifier = Arc::new(Notifier::new(notifications, users.clone()));

        Self {
            accounts: Arc::new(AccountService::new(
                users.clone(),
                passwords,
                media.clone(),
                mail,
                config.reset.clone(),
            )),
            engagement: Arc::new(EngagementService::new(
                users.clone(),
                posts.clone(),
                notifier.clone(),
            )),
            posts: Arc::new(PostService::new(users, posts, media)),
            notifier,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            media_files,
            config: Arc::new(config),
            db: None,
        }
    }
}
