use std::sync::Arc;

use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, StoreKind};
use crate::db;
use crate::users::memory::InMemoryUserStore;
use crate::users::repo::{PgUserStore, UserStore};
use crate::users::services::UserManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserManager,
    pub jwt: Option<JwtKeys>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let store = match config.store {
            StoreKind::Postgres => {
                let pool = db::connect(&config).await?;
                db::migrate(&pool).await?;
                Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory user store; records are lost on restart");
                Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };
        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: AppConfig, store: Arc<dyn UserStore>) -> Self {
        let jwt = config.jwt.as_ref().map(JwtKeys::from_config);
        let users = UserManager::new(store, config.schema);
        Self {
            config: Arc::new(config),
            users,
            jwt,
        }
    }

    #[cfg(test)]
    pub fn fake(schema: crate::config::UserSchema) -> Self {
        let config = AppConfig {
            store: StoreKind::Memory,
            database_url: String::new(),
            max_connections: 1,
            schema,
            jwt: Some(crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            }),
            host: "127.0.0.1".into(),
            port: 0,
        };
        Self::from_parts(config, Arc::new(InMemoryUserStore::new()))
    }
}
