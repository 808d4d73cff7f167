use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::{
    config::AppConfig, maintenance::MaintenanceMode, modules::messages::MessageFilter,
    store::MockStore,
};

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<MockStore>>,
    filter: Arc<Mutex<MessageFilter>>,
    maintenance: Arc<RwLock<MaintenanceMode>>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let store = MockStore::seeded(config).context("failed to seed in-memory store")?;

        info!(
            admin = %config.admin_username,
            mock_data = config.seed_mock_data,
            "seeded in-memory store; change the default admin password promptly"
        );

        let filter = MessageFilter::new(config.messages_per_minute, config.messages_per_day);
        let maintenance = MaintenanceMode::from_config(config);

        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            filter: Arc::new(Mutex::new(filter)),
            maintenance: Arc::new(RwLock::new(maintenance)),
        })
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, MockStore> {
        self.store.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, MockStore> {
        self.store.write().await
    }

    pub fn filter(&self) -> &Mutex<MessageFilter> {
        &self.filter
    }

    pub fn maintenance(&self) -> &RwLock<MaintenanceMode> {
        &self.maintenance
    }
}
