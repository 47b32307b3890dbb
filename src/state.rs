use std::sync::Arc;

use crate::{
    assignments::repo::AssignmentRepo,
    auth::JwtKeys,
    config::AppConfig,
    courses::repo::CourseRepo,
    db::PgStore,
    users::repo::UserRepo,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub courses: Arc<dyn CourseRepo>,
    pub assignments: Arc<dyn AssignmentRepo>,
    pub keys: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Connects to Postgres and applies pending migrations; a failed migration aborts startup.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = PgStore::connect(&config.database).await?;
        store.migrate().await?;
        Ok(Self::from_store(store, config))
    }

    /// One store serves all three repositories.
    pub fn from_store<S>(store: S, config: AppConfig) -> Self
    where
        S: UserRepo + CourseRepo + AssignmentRepo + Clone + 'static,
    {
        Self {
            users: Arc::new(store.clone()),
            courses: Arc::new(store.clone()),
            assignments: Arc::new(store),
            keys: JwtKeys::from_config(&config.jwt),
            config: Arc::new(config),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::{
            config::{DatabaseConfig, JwtConfig},
            db::memory::MemoryStore,
        };

        let config = AppConfig {
            database: DatabaseConfig {
                url: None,
                host: "localhost".into(),
                port: 5432,
                user: "postgres".into(),
                password: String::new(),
                name: "academiaflow_test".into(),
                ssl_mode: "disable".into(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 60,
            },
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".into()],
        };
        Self::from_store(MemoryStore::default(), config)
    }
}
