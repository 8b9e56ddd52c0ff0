#![allow(clippy::unwrap_used)]

use chrono::Utc;
use helpdesk_common::{Identity, TicketStatus, UserRole};
use helpdesk_db_entities::{Category, Ticket, User};
use helpdesk_db_migrations::migrate_database;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

/// Fresh in-memory database with all migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    migrate_database(&db).await.unwrap();
    db
}

/// Inserts a user directly, skipping password hashing.
pub async fn make_user(db: &DatabaseConnection, name: &str, role: UserRole) -> Identity {
    let user = User::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_owned()),
        email: Set(format!("{name}@example.com")),
        password_hash: Set("-".to_owned()),
        role: Set(role),
        language: Set(None),
        interests: Set(serde_json::json!([])),
        profile_image_url: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
    Identity::new(user.id, user.role)
}

pub async fn make_category(db: &DatabaseConnection, name: &str) -> Category::Model {
    Category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_owned()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn make_ticket(
    db: &DatabaseConnection,
    owner: &Identity,
    category: &Category::Model,
    title: &str,
) -> Ticket::Model {
    let now = Utc::now();
    Ticket::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_owned()),
        description: Set(format!("{title} - details")),
        status: Set(TicketStatus::Open),
        user_id: Set(owner.user_id),
        category_id: Set(category.id),
        attachments: Set(serde_json::json!([])),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
}
