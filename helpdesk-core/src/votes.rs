use chrono::Utc;
use helpdesk_common::{AccessPolicy, Action, HelpdeskError, Identity, VotePolarity};
use helpdesk_db_entities::{Downvote, Ticket, Upvote};
use poem_openapi::Object;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, TransactionTrait,
};
use tracing::*;
use uuid::Uuid;

#[derive(Object, Clone, Debug, PartialEq, Eq)]
pub struct VoteSummary {
    pub upvotes: u64,
    pub downvotes: u64,
    /// The viewer's current vote, if any.
    pub my_vote: Option<VotePolarity>,
}

/// Replaces the caller's vote on a ticket. Voting the same way twice is a no-op.
pub async fn vote(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
    ticket_id: Uuid,
    polarity: VotePolarity,
) -> Result<VoteSummary, HelpdeskError> {
    let voter = policy.authorize(identity, Action::Vote)?;

    let txn = db.begin().await?;

    Ticket::Entity::find_by_id(ticket_id)
        .one(&txn)
        .await?
        .ok_or(HelpdeskError::NotFound("ticket"))?;

    Upvote::Entity::delete_many()
        .filter(Upvote::Column::TicketId.eq(ticket_id))
        .filter(Upvote::Column::UserId.eq(voter.user_id))
        .exec(&txn)
        .await?;
    Downvote::Entity::delete_many()
        .filter(Downvote::Column::TicketId.eq(ticket_id))
        .filter(Downvote::Column::UserId.eq(voter.user_id))
        .exec(&txn)
        .await?;

    let now = Utc::now();
    match polarity {
        VotePolarity::Up => {
            Upvote::ActiveModel {
                id: Set(Uuid::new_v4()),
                ticket_id: Set(ticket_id),
                user_id: Set(voter.user_id),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }
        VotePolarity::Down => {
            Downvote::ActiveModel {
                id: Set(Uuid::new_v4()),
                ticket_id: Set(ticket_id),
                user_id: Set(voter.user_id),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }
    }

    let summary = vote_summary(&txn, ticket_id, Some(voter.user_id)).await?;
    txn.commit().await?;

    debug!(ticket = %ticket_id, voter = %voter.user_id, ?polarity, "Vote recorded");
    Ok(summary)
}

pub async fn vote_summary<C: ConnectionTrait>(
    db: &C,
    ticket_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<VoteSummary, DbErr> {
    let upvotes = Upvote::Entity::find()
        .filter(Upvote::Column::TicketId.eq(ticket_id))
        .count(db)
        .await?;
    let downvotes = Downvote::Entity::find()
        .filter(Downvote::Column::TicketId.eq(ticket_id))
        .count(db)
        .await?;

    let my_vote = match viewer {
        Some(user_id) => {
            if Upvote::Entity::find()
                .filter(Upvote::Column::TicketId.eq(ticket_id))
                .filter(Upvote::Column::UserId.eq(user_id))
                .one(db)
                .await?
                .is_some()
            {
                Some(VotePolarity::Up)
            } else if Downvote::Entity::find()
                .filter(Downvote::Column::TicketId.eq(ticket_id))
                .filter(Downvote::Column::UserId.eq(user_id))
                .one(db)
                .await?
                .is_some()
            {
                Some(VotePolarity::Down)
            } else {
                None
            }
        }
        None => None,
    };

    Ok(VoteSummary {
        upvotes,
        downvotes,
        my_vote,
    })
}

#[cfg(test)]
mod tests {
    use helpdesk_common::UserRole;

    use super::*;
    use crate::testing::*;

    async fn rows_for(db: &DatabaseConnection, ticket_id: Uuid, user_id: Uuid) -> (u64, u64) {
        let up = Upvote::Entity::find()
            .filter(Upvote::Column::TicketId.eq(ticket_id))
            .filter(Upvote::Column::UserId.eq(user_id))
            .count(db)
            .await
            .unwrap_or_default();
        let down = Downvote::Entity::find()
            .filter(Downvote::Column::TicketId.eq(ticket_id))
            .filter(Downvote::Column::UserId.eq(user_id))
            .count(db)
            .await
            .unwrap_or_default();
        (up, down)
    }

    #[tokio::test]
    async fn test_repeated_upvote_is_idempotent() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let alice = make_user(&db, "alice", UserRole::User).await;
        let category = make_category(&db, "General").await;
        let ticket = make_ticket(&db, &alice, &category, "Printer broken").await;

        vote(&db, &policy, Some(&alice), ticket.id, VotePolarity::Up).await?;
        let summary = vote(&db, &policy, Some(&alice), ticket.id, VotePolarity::Up).await?;
        assert_eq!(
            summary,
            VoteSummary {
                upvotes: 1,
                downvotes: 0,
                my_vote: Some(VotePolarity::Up),
            }
        );
        assert_eq!(rows_for(&db, ticket.id, alice.user_id).await, (1, 0));
        Ok(())
    }

    #[tokio::test]
    async fn test_at_most_one_vote_per_user() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let alice = make_user(&db, "alice", UserRole::User).await;
        let bob = make_user(&db, "bob", UserRole::User).await;
        let category = make_category(&db, "General").await;
        let ticket = make_ticket(&db, &alice, &category, "Printer broken").await;

        let sequence = [
            (&alice, VotePolarity::Up),
            (&bob, VotePolarity::Down),
            (&alice, VotePolarity::Down),
            (&bob, VotePolarity::Down),
            (&alice, VotePolarity::Up),
            (&bob, VotePolarity::Up),
        ];
        for (voter, polarity) in sequence {
            vote(&db, &policy, Some(voter), ticket.id, polarity).await?;
            for user in [&alice, &bob] {
                let (up, down) = rows_for(&db, ticket.id, user.user_id).await;
                assert!(up + down <= 1);
            }
        }

        let summary = vote_summary(&db, ticket.id, Some(bob.user_id)).await?;
        assert_eq!(summary.upvotes, 2);
        assert_eq!(summary.downvotes, 0);
        assert_eq!(summary.my_vote, Some(VotePolarity::Up));
        Ok(())
    }

    #[tokio::test]
    async fn test_vote_requires_identity_and_ticket() {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let alice = make_user(&db, "alice", UserRole::User).await;
        let category = make_category(&db, "General").await;
        let ticket = make_ticket(&db, &alice, &category, "Printer broken").await;

        assert!(matches!(
            vote(&db, &policy, None, ticket.id, VotePolarity::Up).await,
            Err(HelpdeskError::Unauthorized)
        ));
        assert!(matches!(
            vote(&db, &policy, Some(&alice), Uuid::new_v4(), VotePolarity::Up).await,
            Err(HelpdeskError::NotFound(_))
        ));
    }
}
