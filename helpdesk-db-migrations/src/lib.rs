use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;
use sea_orm_migration::MigrationTrait;

mod m00001_create_users;
mod m00002_create_categories;
mod m00003_create_tickets;
mod m00004_create_comments;
mod m00005_create_ticket_status_history;
mod m00006_create_votes;
mod m00007_create_upgrade_requests;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m00001_create_users::Migration),
            Box::new(m00002_create_categories::Migration),
            Box::new(m00003_create_tickets::Migration),
            Box::new(m00004_create_comments::Migration),
            Box::new(m00005_create_ticket_status_history::Migration),
            Box::new(m00006_create_votes::Migration),
            Box::new(m00007_create_upgrade_requests::Migration),
        ]
    }
}

pub async fn migrate_database(connection: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(connection, None).await
}
