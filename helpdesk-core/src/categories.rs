use helpdesk_common::validation::Validator;
use helpdesk_common::{AccessPolicy, Action, HelpdeskError, Identity};
use helpdesk_db_entities::Category;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::*;
use uuid::Uuid;

pub async fn list_categories(
    db: &DatabaseConnection,
) -> Result<Vec<Category::Model>, HelpdeskError> {
    Ok(Category::Entity::find()
        .order_by_asc(Category::Column::Name)
        .all(db)
        .await?)
}

/// Case-insensitive lookup by name.
pub async fn find_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<Category::Model>, HelpdeskError> {
    Ok(Category::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(Category::Column::Name)))
                .eq(name.trim().to_lowercase()),
        )
        .one(db)
        .await?)
}

pub async fn create_category(
    db: &DatabaseConnection,
    policy: &AccessPolicy,
    identity: Option<&Identity>,
    name: &str,
) -> Result<Category::Model, HelpdeskError> {
    let admin = policy.authorize(identity, Action::ManageCategories)?;
    Validator::new().min_len("name", name, 2).finish()?;

    if find_by_name(db, name).await?.is_some() {
        return Err(HelpdeskError::Conflict(format!(
            "category {:?} already exists",
            name.trim()
        )));
    }

    let category = Category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_owned()),
    }
    .insert(db)
    .await?;
    info!(category = %category.name, admin = %admin.user_id, "Category created");
    Ok(category)
}

/// Creates any of `names` that do not exist yet and returns how many were added.
pub async fn ensure_categories(
    db: &DatabaseConnection,
    names: &[String],
) -> Result<usize, HelpdeskError> {
    let mut created = 0;
    for name in names {
        if find_by_name(db, name).await?.is_some() {
            continue;
        }
        Category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_owned()),
        }
        .insert(db)
        .await?;
        created += 1;
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use helpdesk_common::UserRole;

    use super::*;
    use crate::testing::*;

    #[tokio::test]
    async fn test_ensure_categories_is_idempotent() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let names = vec!["General".to_owned(), "Billing".to_owned()];
        assert_eq!(ensure_categories(&db, &names).await?, 2);
        assert_eq!(ensure_categories(&db, &names).await?, 0);

        let listed: Vec<_> = list_categories(&db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(listed, vec!["Billing", "General"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_only_admin_creates_categories() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let policy = AccessPolicy::default();
        let admin = make_user(&db, "admin", UserRole::Admin).await;
        let agent = make_user(&db, "agent", UserRole::SupportAgent).await;

        assert!(matches!(
            create_category(&db, &policy, None, "Hardware").await,
            Err(HelpdeskError::Unauthorized)
        ));
        assert!(matches!(
            create_category(&db, &policy, Some(&agent), "Hardware").await,
            Err(HelpdeskError::Forbidden)
        ));

        let category = create_category(&db, &policy, Some(&admin), " Hardware ").await?;
        assert_eq!(category.name, "Hardware");
        assert!(matches!(
            create_category(&db, &policy, Some(&admin), "hardware").await,
            Err(HelpdeskError::Conflict(_))
        ));
        assert!(matches!(
            create_category(&db, &policy, Some(&admin), "x").await,
            Err(HelpdeskError::Validation(_))
        ));
        Ok(())
    }
}
