use std::sync::Arc;

use anyhow::Result;
use helpdesk_common::{AccessPolicy, HelpdeskConfig};
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tracing::debug;

use crate::db::{connect_to_db, populate_db};

#[derive(Clone)]
pub struct Services {
    pub db: Arc<Mutex<DatabaseConnection>>,
    pub config: Arc<Mutex<HelpdeskConfig>>,
    pub policy: Arc<AccessPolicy>,
}

impl Services {
    pub async fn new(config: HelpdeskConfig) -> Result<Self> {
        let db = connect_to_db(&config).await?;
        populate_db(&db, &config).await?;

        let policy = AccessPolicy::from(&config.store.policy);
        debug!(?policy, "Access policy loaded");

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(Mutex::new(config)),
            policy: Arc::new(policy),
        })
    }
}
