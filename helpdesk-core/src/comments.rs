use chrono::{DateTime, Utc};
use helpdesk_common::validation::Validator;
use helpdesk_common::{AccessPolicy, Action, CommentKind, HelpdeskError, Identity};
use helpdesk_db_entities::{Comment, Ticket, User};
use poem_openapi::Object;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::*;
use uuid::Uuid;

use crate::users::UserSummary;

/// Which endpoint a comment came in through. Responses are staff-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentPath {
    Comment,
    Respond,
}

impl CommentPath {
    fn body_field(&self) -> &'static str {
        match self {
            Self::Comment => "text",
            Self::Respond => "message",
        }
    }
}

#[derive(Object, Clone, Debug)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub body: String,
    pub kind: CommentKind,
    pub created_at: DateTime<Utc>,
    pub author: UserSummary,
}

impl CommentWithAuthor {
    fn new(comment: Comment::Model, author: &User::Model) -> Self {
        Self {
            id: comment.id,
            ticket_id: comment.ticket_id,
            body: comment.body,
            kind: comment.kind,
            created_at: comment.created_at,
            author: author.into(),
        }
    }
}

pub async fn add_comment(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
    ticket_id: Uuid,
    body: &str,
    path: CommentPath,
) -> Result<CommentWithAuthor, HelpdeskError> {
    let identity = identity.ok_or(HelpdeskError::Unauthorized)?;
    if path == CommentPath::Respond {
        policy.authorize(Some(identity), Action::Respond)?;
    }

    let ticket = Ticket::Entity::find_by_id(ticket_id)
        .one(db)
        .await?
        .ok_or(HelpdeskError::NotFound("ticket"))?;

    let kind = match path {
        CommentPath::Respond => CommentKind::StaffResponse,
        CommentPath::Comment => {
            policy.authorize(
                Some(identity),
                Action::Comment {
                    owner_id: ticket.user_id,
                },
            )?;
            if identity.user_id == ticket.user_id {
                CommentKind::OwnerComment
            } else {
                CommentKind::StaffResponse
            }
        }
    };

    Validator::new()
        .min_len(path.body_field(), body, 1)
        .finish()?;

    let author = User::Entity::find_by_id(identity.user_id)
        .one(db)
        .await?
        .ok_or(HelpdeskError::NotFound("user"))?;

    let comment = Comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        ticket_id: Set(ticket.id),
        user_id: Set(author.id),
        body: Set(body.trim().to_owned()),
        kind: Set(kind),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    debug!(ticket = %ticket.id, author = %author.id, ?kind, "Comment added");
    Ok(CommentWithAuthor::new(comment, &author))
}

/// All comments on a ticket, oldest first.
pub async fn list_comments(
    db: &DatabaseConnection,
    ticket_id: Uuid,
) -> Result<Vec<CommentWithAuthor>, HelpdeskError> {
    Comment::Entity::find()
        .filter(Comment::Column::TicketId.eq(ticket_id))
        .order_by_asc(Comment::Column::CreatedAt)
        .find_also_related(User::Entity)
        .all(db)
        .await?
        .into_iter()
        .map(|(comment, author)| {
            let author = author.ok_or(HelpdeskError::NotFound("comment author"))?;
            Ok(CommentWithAuthor::new(comment, &author))
        })
        .collect()
}
