use std::collections::HashMap;

use chrono::{DateTime, Utc};
use helpdesk_common::validation::Validator;
use helpdesk_common::{AccessPolicy, Action, HelpdeskError, Identity, TicketStatus};
use helpdesk_db_entities::{Category, Ticket, User};
use poem_openapi::{Enum, Object};
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder,
};
use tracing::*;
use uuid::Uuid;

use crate::categories;
use crate::comments::{list_comments, CommentWithAuthor};
use crate::lifecycle::{status_history, StatusChange};
use crate::pagination::{fetch_page, PaginatedResponse, PaginationParams};
use crate::users::UserSummary;
use crate::votes::{vote_summary, VoteSummary};

#[derive(Clone, Debug)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub category: String,
    pub attachment: Option<String>,
}

#[derive(Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[oai(rename_all = "snake_case")]
pub enum TicketSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Status,
}

impl TicketSort {
    fn column(&self) -> Ticket::Column {
        match self {
            Self::CreatedAt => Ticket::Column::CreatedAt,
            Self::UpdatedAt => Ticket::Column::UpdatedAt,
            Self::Title => Ticket::Column::Title,
            Self::Status => Ticket::Column::Status,
        }
    }
}

#[derive(Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[oai(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[oai(rename_all = "lowercase")]
pub enum TicketScope {
    #[default]
    All,
    Mine,
}

#[derive(Clone, Debug, Default)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: TicketSort,
    pub order: SortOrder,
    pub scope: TicketScope,
    pub pagination: PaginationParams,
}

#[derive(Object, Clone, Debug)]
pub struct TicketSummary {
    pub id: Uuid,
    pub title: String,
    pub status: TicketStatus,
    pub category: String,
    pub owner: UserSummary,
    pub upvotes: u64,
    pub downvotes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Object, Clone, Debug)]
pub struct TicketDetails {
    pub ticket: Ticket::Model,
    pub owner: UserSummary,
    pub category: Category::Model,
    pub comments: Vec<CommentWithAuthor>,
    pub history: Vec<StatusChange>,
    pub votes: VoteSummary,
}

pub async fn create_ticket(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
    new: NewTicket,
) -> Result<Ticket::Model, HelpdeskError> {
    let owner = policy.authorize(identity, Action::CreateTicket)?;

    let mut validator = Validator::new();
    validator
        .min_len("subject", &new.subject, 5)
        .min_len("description", &new.description, 10)
        .min_len("category", &new.category, 2);
    if let Some(attachment) = &new.attachment {
        validator.url("attachment", attachment);
    }
    validator.finish()?;

    let category = categories::find_by_name(db, &new.category)
        .await?
        .ok_or_else(|| HelpdeskError::validation("category", "unknown category"))?;

    let attachments: Vec<String> = new.attachment.into_iter().collect();
    let now = Utc::now();
    let ticket = Ticket::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(new.subject.trim().to_owned()),
        description: Set(new.description.trim().to_owned()),
        status: Set(TicketStatus::Open),
        user_id: Set(owner.user_id),
        category_id: Set(category.id),
        attachments: Set(serde_json::to_value(attachments)?),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(ticket = %ticket.id, owner = %owner.user_id, category = %category.name, "Ticket created");
    Ok(ticket)
}

/// Makes `%`, `_` and `\` match literally in a LIKE pattern escaped with `\`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Public listing. `scope=mine` restricts to the caller's tickets and needs an identity.
pub async fn list_tickets(
    db: &DatabaseConnection,
    identity: Option<&Identity>,
    query: TicketQuery,
) -> Result<PaginatedResponse<TicketSummary>, HelpdeskError> {
    let mut select = Ticket::Entity::find();

    if query.scope == TicketScope::Mine {
        let identity = identity.ok_or(HelpdeskError::Unauthorized)?;
        select = select.filter(Ticket::Column::UserId.eq(identity.user_id));
    }
    if let Some(status) = query.status {
        select = select.filter(Ticket::Column::Status.eq(status));
    }
    if let Some(category) = &query.category {
        select = select.filter(
            Ticket::Column::CategoryId.in_subquery(
                Query::select()
                    .column(Category::Column::Id)
                    .from(Category::Entity)
                    .and_where(
                        Expr::expr(Func::lower(Expr::col(Category::Column::Name)))
                            .eq(category.trim().to_lowercase()),
                    )
                    .to_owned(),
            ),
        );
    }
    if let Some(search) = query.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(Ticket::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(Ticket::Column::Description)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let order = match query.order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    select = select
        .order_by(query.sort.column(), order)
        .order_by(Ticket::Column::Id, Order::Asc);

    let (tickets, meta) = fetch_page(select, query.pagination, db).await?;

    let category_ids: Vec<Uuid> = tickets.iter().map(|t| t.category_id).collect();
    let owner_ids: Vec<Uuid> = tickets.iter().map(|t| t.user_id).collect();
    let category_names: HashMap<Uuid, String> = Category::Entity::find()
        .filter(Category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let owners: HashMap<Uuid, User::Model> = User::Entity::find()
        .filter(User::Column::Id.is_in(owner_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut items = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let owner = owners
            .get(&ticket.user_id)
            .ok_or(HelpdeskError::NotFound("ticket owner"))?;
        let votes = vote_summary(db, ticket.id, None).await?;
        items.push(TicketSummary {
            id: ticket.id,
            title: ticket.title,
            status: ticket.status,
            category: category_names
                .get(&ticket.category_id)
                .cloned()
                .unwrap_or_default(),
            owner: owner.into(),
            upvotes: votes.upvotes,
            downvotes: votes.downvotes,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        });
    }

    Ok(PaginatedResponse { items, meta })
}

/// Full ticket view for the owner or staff.
pub async fn get_ticket(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
    ticket_id: Uuid,
) -> Result<TicketDetails, HelpdeskError> {
    let identity = identity.ok_or(HelpdeskError::Unauthorized)?;

    let (ticket, owner) = Ticket::Entity::find_by_id(ticket_id)
        .find_also_related(User::Entity)
        .one(db)
        .await?
        .ok_or(HelpdeskError::NotFound("ticket"))?;
    let owner = owner.ok_or(HelpdeskError::NotFound("ticket owner"))?;

    policy.authorize(
        Some(identity),
        Action::ViewTicket {
            owner_id: ticket.user_id,
        },
    )?;

    let category = Category::Entity::find_by_id(ticket.category_id)
        .one(db)
        .await?
        .ok_or(HelpdeskError::NotFound("category"))?;

    let comments = list_comments(db, ticket.id).await?;
    let history = status_history(db, ticket.id).await?;
    let votes = vote_summary(db, ticket.id, Some(identity.user_id)).await?;

    Ok(TicketDetails {
        owner: (&owner).into(),
        ticket,
        category,
        comments,
        history,
        votes,
    })
}
