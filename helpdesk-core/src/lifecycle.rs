use chrono::{DateTime, Utc};
use helpdesk_common::{AccessPolicy, Action, HelpdeskError, Identity, TicketStatus};
use helpdesk_db_entities::{Ticket, TicketStatusHistory, User};
use poem_openapi::Object;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::*;
use uuid::Uuid;

use crate::users::UserSummary;

#[derive(Object, Clone, Debug)]
pub struct StatusChange {
    pub id: Uuid,
    pub old_status: TicketStatus,
    pub new_status: TicketStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: UserSummary,
}

/// Moves a ticket to `requested` and records the change.
///
/// The ticket is re-read inside the transaction; the status update and the
/// history row commit together or not at all.
pub async fn transition(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
    ticket_id: Uuid,
    requested: TicketStatus,
) -> Result<Ticket::Model, HelpdeskError> {
    let actor = policy.authorize(identity, Action::TransitionStatus)?;

    let txn = db.begin().await?;

    let ticket = Ticket::Entity::find_by_id(ticket_id)
        .one(&txn)
        .await?
        .ok_or(HelpdeskError::NotFound("ticket"))?;

    let current = ticket.status;
    if !current.can_transition_to(requested) {
        return Err(HelpdeskError::InvalidTransition {
            from: current,
            to: requested,
        });
    }

    let now = Utc::now();
    let mut model: Ticket::ActiveModel = ticket.into();
    model.status = Set(requested);
    model.updated_at = Set(now);
    let ticket = model.update(&txn).await?;

    TicketStatusHistory::ActiveModel {
        id: Set(Uuid::new_v4()),
        ticket_id: Set(ticket_id),
        old_status: Set(current),
        new_status: Set(requested),
        changed_by_id: Set(actor.user_id),
        changed_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        ticket = %ticket_id,
        from = %current,
        to = %requested,
        actor = %actor.user_id,
        "Ticket status changed"
    );
    Ok(ticket)
}

/// Status history of a ticket, oldest first.
pub async fn status_history(
    db: &DatabaseConnection,
    ticket_id: Uuid,
) -> Result<Vec<StatusChange>, HelpdeskError> {
    TicketStatusHistory::Entity::find()
        .filter(TicketStatusHistory::Column::TicketId.eq(ticket_id))
        .order_by_asc(TicketStatusHistory::Column::ChangedAt)
        .find_also_related(User::Entity)
        .all(db)
        .await?
        .into_iter()
        .map(|(change, actor)| {
            let actor: User::Model = actor.ok_or(HelpdeskError::NotFound("user"))?;
            Ok(StatusChange {
                id: change.id,
                old_status: change.old_status,
                new_status: change.new_status,
                changed_at: change.changed_at,
                changed_by: (&actor).into(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use helpdesk_common::UserRole;
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::testing::*;

    async fn history_len(db: &DatabaseConnection, ticket_id: Uuid) -> u64 {
        TicketStatusHistory::Entity::find()
            .filter(TicketStatusHistory::Column::TicketId.eq(ticket_id))
            .count(db)
            .await
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_transition_writes_history() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let owner = make_user(&db, "owner", UserRole::User).await;
        let agent = make_user(&db, "agent", UserRole::SupportAgent).await;
        let category = make_category(&db, "General").await;
        let ticket = make_ticket(&db, &owner, &category, "Printer broken").await;

        let path = [
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            TicketStatus::Closed,
        ];
        for (i, status) in path.into_iter().enumerate() {
            let updated = transition(&db, &policy, Some(&agent), ticket.id, status).await?;
            assert_eq!(updated.status, status);
            assert_eq!(history_len(&db, ticket.id).await, i as u64 + 1);
        }

        let history = status_history(&db, ticket.id).await?;
        let last = history.last().map(|c| (c.old_status, c.new_status));
        assert_eq!(last, Some((TicketStatus::Resolved, TicketStatus::Closed)));
        assert!(history.iter().all(|c| c.changed_by.id == agent.user_id));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_transition_changes_nothing() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let owner = make_user(&db, "owner", UserRole::User).await;
        let admin = make_user(&db, "admin", UserRole::Admin).await;
        let category = make_category(&db, "General").await;
        let ticket = make_ticket(&db, &owner, &category, "Printer broken").await;

        let result = transition(&db, &policy, Some(&admin), ticket.id, TicketStatus::Resolved).await;
        assert!(matches!(
            result,
            Err(HelpdeskError::InvalidTransition {
                from: TicketStatus::Open,
                to: TicketStatus::Resolved
            })
        ));

        let reloaded = Ticket::Entity::find_by_id(ticket.id).one(&db).await?;
        assert_eq!(reloaded.map(|t| t.status), Some(TicketStatus::Open));
        assert_eq!(history_len(&db, ticket.id).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_history_insert_rolls_back_status() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let owner = make_user(&db, "owner", UserRole::User).await;
        let category = make_category(&db, "General").await;
        let ticket = make_ticket(&db, &owner, &category, "Printer broken").await;

        // no users row, so the history foreign key rejects the insert
        let ghost = Identity::new(Uuid::new_v4(), UserRole::Admin);
        let result =
            transition(&db, &policy, Some(&ghost), ticket.id, TicketStatus::InProgress).await;
        assert!(result.is_err());

        let reloaded = Ticket::Entity::find_by_id(ticket.id).one(&db).await?;
        assert_eq!(reloaded.map(|t| t.status), Some(TicketStatus::Open));
        assert_eq!(history_len(&db, ticket.id).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_transition_access() {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let owner = make_user(&db, "owner", UserRole::User).await;
        let resolver = make_user(&db, "resolver", UserRole::QueryResolver).await;
        let category = make_category(&db, "General").await;
        let ticket = make_ticket(&db, &owner, &category, "Printer broken").await;

        assert!(matches!(
            transition(&db, &policy, None, ticket.id, TicketStatus::Closed).await,
            Err(HelpdeskError::Unauthorized)
        ));
        assert!(matches!(
            transition(&db, &policy, Some(&owner), ticket.id, TicketStatus::Closed).await,
            Err(HelpdeskError::Forbidden)
        ));
        // not in the default staff set
        assert!(matches!(
            transition(&db, &policy, Some(&resolver), ticket.id, TicketStatus::Closed).await,
            Err(HelpdeskError::Forbidden)
        ));

        let policy = AccessPolicy::new([UserRole::QueryResolver]);
        assert!(transition(&db, &policy, Some(&resolver), ticket.id, TicketStatus::Closed)
            .await
            .is_ok());
        assert!(matches!(
            transition(&db, &policy, Some(&resolver), Uuid::new_v4(), TicketStatus::Closed).await,
            Err(HelpdeskError::NotFound(_))
        ));
    }
}
