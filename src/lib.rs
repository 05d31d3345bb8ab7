pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::app::auth::AccessTokens;
use crate::app::composer::Composer;
use crate::app::delivery::DeliveryResolver;
use crate::app::events::EventBus;
use crate::config::{AppConfig, StoreBackend};
use crate::infra::store::{NotificationStore, ProfileStore};
use crate::infra::{db::Db, memory::MemoryStore, pg_store::PgStore};

#[derive(Clone)]
pub struct AppState {
    pub notifications: Arc<dyn NotificationStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub events: EventBus,
    pub tokens: AccessTokens,
    pub store_timeout: Duration,
}

impl AppState {
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let notifications: Arc<dyn NotificationStore>;
        let profiles: Arc<dyn ProfileStore>;
        match config.store_backend {
            StoreBackend::Postgres => {
                let store = Arc::new(PgStore::new(Db::connect(config).await?));
                notifications = store.clone();
                profiles = store;
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                notifications = store.clone();
                profiles = store;
            }
        }

        Ok(Self {
            notifications,
            profiles,
            events: EventBus::new(config.event_bus_capacity),
            tokens: AccessTokens::new(config.access_token_key),
            store_timeout: Duration::from_secs(config.store_timeout_seconds),
        })
    }

    pub fn resolver(&self) -> DeliveryResolver {
        DeliveryResolver::new(self.notifications.clone(), self.store_timeout)
    }

    pub fn composer(&self) -> Composer {
        Composer::new(
            self.notifications.clone(),
            self.profiles.clone(),
            self.events.clone(),
            self.store_timeout,
        )
    }
}
