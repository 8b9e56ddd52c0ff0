use chrono::{DateTime, Utc};
use helpdesk_common::TicketStatus;
use poem_openapi::Object;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Object)]
#[sea_orm(table_name = "tickets")]
#[oai(rename = "Ticket")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub status: TicketStatus,
    pub user_id: Uuid,
    pub category_id: Uuid,
    /// JSON array of attachment URLs
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::User::Entity",
        from = "Column::UserId",
        to = "super::User::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::Category::Entity",
        from = "Column::CategoryId",
        to = "super::Category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::Comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::TicketStatusHistory::Entity")]
    StatusHistory,
}

impl Related<super::User::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::Category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::Comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::TicketStatusHistory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn attachment_urls(&self) -> Vec<String> {
        serde_json::from_value(self.attachments.clone()).unwrap_or_default()
    }
}
