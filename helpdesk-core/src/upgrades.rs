use chrono::{DateTime, Utc};
use helpdesk_common::{
    AccessPolicy, Action, HelpdeskError, Identity, UpgradeRequestStatus, UserRole,
};
use helpdesk_db_entities::{UpgradeRequest, User};
use poem_openapi::Object;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::*;
use uuid::Uuid;

/// An upgrade request as shown to admins, with the requester's details.
#[derive(Object, Clone, Debug)]
pub struct UpgradeRequestWithUser {
    pub id: Uuid,
    pub status: UpgradeRequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_role: UserRole,
}

pub async fn request_upgrade(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
) -> Result<UpgradeRequest::Model, HelpdeskError> {
    let requester = policy.authorize(identity, Action::RequestUpgrade)?;
    if requester.role != UserRole::User {
        return Err(HelpdeskError::Conflict(format!(
            "only USER accounts can request an upgrade, not {}",
            requester.role
        )));
    }

    let txn = db.begin().await?;

    let pending = UpgradeRequest::Entity::find()
        .filter(UpgradeRequest::Column::UserId.eq(requester.user_id))
        .filter(UpgradeRequest::Column::Status.eq(UpgradeRequestStatus::Pending))
        .one(&txn)
        .await?;
    if pending.is_some() {
        return Err(HelpdeskError::Conflict(
            "an upgrade request is already pending".into(),
        ));
    }

    let request = UpgradeRequest::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(requester.user_id),
        status: Set(UpgradeRequestStatus::Pending),
        created_at: Set(Utc::now()),
        decided_at: Set(None),
        decided_by: Set(None),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(request = %request.id, user = %requester.user_id, "Upgrade requested");
    Ok(request)
}

/// Grants `grant_role` to the requester and closes the request.
/// Only ever raises a USER; any other current role fails with `InvalidState`.
pub async fn approve_upgrade(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
    grant_role: UserRole,
    request_id: Uuid,
) -> Result<UpgradeRequest::Model, HelpdeskError> {
    let admin = policy.authorize(identity, Action::ApproveUpgrade)?;

    let txn = db.begin().await?;

    let request = UpgradeRequest::Entity::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or(HelpdeskError::NotFound("upgrade request"))?;
    if request.status != UpgradeRequestStatus::Pending {
        return Err(HelpdeskError::InvalidState(
            "upgrade request is not pending".into(),
        ));
    }

    let user = User::Entity::find_by_id(request.user_id)
        .one(&txn)
        .await?
        .ok_or(HelpdeskError::NotFound("user"))?;
    // the role may have changed since the request was filed
    if user.role != UserRole::User {
        return Err(HelpdeskError::InvalidState(format!(
            "user already has the {} role",
            user.role
        )));
    }
    let previous_role = user.role;
    let mut user: User::ActiveModel = user.into();
    user.role = Set(grant_role);
    user.update(&txn).await?;

    let mut model: UpgradeRequest::ActiveModel = request.into();
    model.status = Set(UpgradeRequestStatus::Approved);
    model.decided_at = Set(Some(Utc::now()));
    model.decided_by = Set(Some(admin.user_id));
    let request = model.update(&txn).await?;

    txn.commit().await?;

    info!(
        request = %request.id,
        user = %request.user_id,
        from = %previous_role,
        to = %grant_role,
        admin = %admin.user_id,
        "Upgrade approved"
    );
    Ok(request)
}

/// Admin listing, newest first.
pub async fn list_upgrade_requests(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
    status: Option<UpgradeRequestStatus>,
) -> Result<Vec<UpgradeRequestWithUser>, HelpdeskError> {
    policy.authorize(identity, Action::ListUpgradeRequests)?;

    let mut query = UpgradeRequest::Entity::find();
    if let Some(status) = status {
        query = query.filter(UpgradeRequest::Column::Status.eq(status));
    }

    query
        .order_by_desc(UpgradeRequest::Column::CreatedAt)
        .find_also_related(User::Entity)
        .all(db)
        .await?
        .into_iter()
        .map(|(request, user)| {
            let user = user.ok_or(HelpdeskError::NotFound("user"))?;
            Ok(UpgradeRequestWithUser {
                id: request.id,
                status: request.status,
                created_at: request.created_at,
                decided_at: request.decided_at,
                decided_by: request.decided_by,
                user_id: user.id,
                user_name: user.name,
                user_email: user.email,
                user_role: user.role,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::testing::*;

    async fn pending_count(db: &DatabaseConnection, user_id: Uuid) -> u64 {
        UpgradeRequest::Entity::find()
            .filter(UpgradeRequest::Column::UserId.eq(user_id))
            .filter(UpgradeRequest::Column::Status.eq(UpgradeRequestStatus::Pending))
            .count(db)
            .await
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_second_pending_request_conflicts() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let carol = make_user(&db, "carol", UserRole::User).await;

        request_upgrade(&db, &policy, Some(&carol)).await?;
        assert!(matches!(
            request_upgrade(&db, &policy, Some(&carol)).await,
            Err(HelpdeskError::Conflict(_))
        ));
        assert_eq!(pending_count(&db, carol.user_id).await, 1);

        assert!(matches!(
            request_upgrade(&db, &policy, None).await,
            Err(HelpdeskError::Unauthorized)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_upgrade_end_to_end() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let carol = make_user(&db, "carol", UserRole::User).await;
        let dave = make_user(&db, "dave", UserRole::Admin).await;

        let request = request_upgrade(&db, &policy, Some(&carol)).await?;
        let approved =
            approve_upgrade(&db, &policy, Some(&dave), UserRole::SupportAgent, request.id).await?;
        assert_eq!(approved.status, UpgradeRequestStatus::Approved);
        assert_eq!(approved.decided_by, Some(dave.user_id));
        assert!(approved.decided_at.is_some());

        let user = User::Entity::find_by_id(carol.user_id).one(&db).await?;
        assert_eq!(user.map(|u| u.role), Some(UserRole::SupportAgent));

        assert_eq!(pending_count(&db, carol.user_id).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_staff_cannot_request_upgrade() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let agent = make_user(&db, "agent", UserRole::SupportAgent).await;
        let admin = make_user(&db, "admin", UserRole::Admin).await;

        for identity in [&agent, &admin] {
            assert!(matches!(
                request_upgrade(&db, &policy, Some(identity)).await,
                Err(HelpdeskError::Conflict(_))
            ));
            assert_eq!(pending_count(&db, identity.user_id).await, 0);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_never_lowers_a_role() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let carol = make_user(&db, "carol", UserRole::User).await;
        let dave = make_user(&db, "dave", UserRole::Admin).await;
        let request = request_upgrade(&db, &policy, Some(&carol)).await?;

        // promoted to ADMIN by other means while the request was pending
        if let Some(user) = User::Entity::find_by_id(carol.user_id).one(&db).await? {
            let mut user: User::ActiveModel = user.into();
            user.role = Set(UserRole::Admin);
            user.update(&db).await?;
        }

        assert!(matches!(
            approve_upgrade(&db, &policy, Some(&dave), UserRole::SupportAgent, request.id).await,
            Err(HelpdeskError::InvalidState(_))
        ));

        let user = User::Entity::find_by_id(carol.user_id).one(&db).await?;
        assert_eq!(user.map(|u| u.role), Some(UserRole::Admin));
        assert_eq!(pending_count(&db, carol.user_id).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_checks() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let carol = make_user(&db, "carol", UserRole::User).await;
        let agent = make_user(&db, "agent", UserRole::SupportAgent).await;
        let dave = make_user(&db, "dave", UserRole::Admin).await;
        let request = request_upgrade(&db, &policy, Some(&carol)).await?;

        assert!(matches!(
            approve_upgrade(&db, &policy, Some(&agent), UserRole::SupportAgent, request.id).await,
            Err(HelpdeskError::Forbidden)
        ));
        assert!(matches!(
            approve_upgrade(&db, &policy, Some(&dave), UserRole::SupportAgent, Uuid::new_v4())
                .await,
            Err(HelpdeskError::NotFound(_))
        ));

        approve_upgrade(&db, &policy, Some(&dave), UserRole::SupportAgent, request.id).await?;
        assert!(matches!(
            approve_upgrade(&db, &policy, Some(&dave), UserRole::SupportAgent, request.id).await,
            Err(HelpdeskError::InvalidState(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_upgrade_requests() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let carol = make_user(&db, "carol", UserRole::User).await;
        let erin = make_user(&db, "erin", UserRole::User).await;
        let dave = make_user(&db, "dave", UserRole::Admin).await;

        let request = request_upgrade(&db, &policy, Some(&carol)).await?;
        request_upgrade(&db, &policy, Some(&erin)).await?;
        approve_upgrade(&db, &policy, Some(&dave), UserRole::SupportAgent, request.id).await?;

        assert!(matches!(
            list_upgrade_requests(&db, &policy, Some(&carol), None).await,
            Err(HelpdeskError::Forbidden)
        ));

        let all = list_upgrade_requests(&db, &policy, Some(&dave), None).await?;
        assert_eq!(all.len(), 2);

        let pending = list_upgrade_requests(
            &db,
            &policy,
            Some(&dave),
            Some(UpgradeRequestStatus::Pending),
        )
        .await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].user_name, "erin");
        assert_eq!(pending[0].user_email, "erin@example.com");
        Ok(())
    }
}
