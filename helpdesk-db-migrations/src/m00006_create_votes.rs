use sea_orm::sea_query::ForeignKeyAction;
use sea_orm_migration::prelude::*;

const VOTE_TABLES: [&str; 2] = ["upvotes", "downvotes"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in VOTE_TABLES {
            manager
                .create_table(
                    Table::create()
                        .table(Alias::new(table))
                        .col(
                            ColumnDef::new(Alias::new("id"))
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Alias::new("ticket_id")).uuid().not_null())
                        .col(ColumnDef::new(Alias::new("user_id")).uuid().not_null())
                        .col(
                            ColumnDef::new(Alias::new("created_at"))
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(Alias::new(table), Alias::new("ticket_id"))
                                .to(Alias::new("tickets"), Alias::new("id"))
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(Alias::new(table), Alias::new("user_id"))
                                .to(Alias::new("users"), Alias::new("id"))
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // one vote per user and ticket within each table
            manager
                .create_index(
                    Index::create()
                        .table(Alias::new(table))
                        .name(format!("idx_{table}_ticket_user"))
                        .col(Alias::new("ticket_id"))
                        .col(Alias::new("user_id"))
                        .unique()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in VOTE_TABLES {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
