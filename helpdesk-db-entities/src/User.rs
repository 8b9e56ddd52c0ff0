use chrono::{DateTime, Utc};
use helpdesk_common::UserRole;
use poem_openapi::Object;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Object)]
#[sea_orm(table_name = "users")]
#[oai(rename = "User")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[oai(skip)]
    #[serde(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub language: Option<String>,
    /// JSON array of strings
    #[sea_orm(column_type = "JsonBinary")]
    pub interests: serde_json::Value,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::Ticket::Entity")]
    Tickets,
    #[sea_orm(has_many = "super::UpgradeRequest::Entity")]
    UpgradeRequests,
}

impl Related<super::Ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl Related<super::UpgradeRequest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UpgradeRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn interest_list(&self) -> Vec<String> {
        serde_json::from_value(self.interests.clone()).unwrap_or_default()
    }
}
