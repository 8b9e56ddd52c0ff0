use std::time::Duration;

use anyhow::Result;
use helpdesk_common::helpers::fs::secure_file;
use helpdesk_common::{HelpdeskConfig, HelpdeskError};
use helpdesk_db_migrations::migrate_database;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, TransactionTrait};
use tracing::*;

use crate::categories::ensure_categories;
use crate::consts::SQLITE_DB_FILE_NAME;

pub async fn connect_to_db(config: &HelpdeskConfig) -> Result<DatabaseConnection> {
    let mut url = url::Url::parse(&config.store.database_url.expose_secret()[..])?;
    if url.scheme() == "sqlite" {
        let path = url.path();
        let mut abs_path = config.paths_relative_to.clone();
        abs_path.push(path);
        abs_path.push(SQLITE_DB_FILE_NAME);

        if let Some(parent) = abs_path.parent() {
            std::fs::create_dir_all(parent)?
        }

        url.set_path(
            abs_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Failed to convert database path to string"))?,
        );

        url.set_query(Some("mode=rwc"));

        let db = Database::connect(ConnectOptions::new(url.to_string())).await?;
        db.begin().await?.commit().await?;
        drop(db);

        secure_file(&abs_path)?;
    }

    let mut opt = ConnectOptions::new(url.to_string());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let connection = Database::connect(opt).await?;

    migrate_database(&connection).await?;
    Ok(connection)
}

/// Seeds the configured categories. Existing rows are left alone.
pub async fn populate_db(
    db: &DatabaseConnection,
    config: &HelpdeskConfig,
) -> Result<(), HelpdeskError> {
    let created = ensure_categories(db, &config.store.categories).await?;
    if created > 0 {
        info!(count = created, "Seeded ticket categories");
    }
    Ok(())
}
