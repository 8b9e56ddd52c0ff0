use chrono::Utc;
use helpdesk_common::helpers::hash::{hash_password, verify_password_hash};
use helpdesk_common::validation::Validator;
use helpdesk_common::{HelpdeskError, Identity, Secret, UserRole};
use helpdesk_db_entities::User;
use poem_openapi::Object;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::*;
use uuid::Uuid;

/// Public view of a user, attached to tickets, comments and history entries.
#[derive(Object, Clone, Debug, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl From<&User::Model> for UserSummary {
    fn from(user: &User::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}

pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: Secret<String>,
    pub confirm_password: Secret<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub language: Option<String>,
    pub interests: Option<Vec<String>>,
    pub profile_image_url: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<User::Model>, HelpdeskError> {
    Ok(User::Entity::find()
        .filter(User::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?)
}

async fn insert_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &Secret<String>,
    role: UserRole,
) -> Result<User::Model, HelpdeskError> {
    if find_by_email(db, email).await?.is_some() {
        return Err(HelpdeskError::Conflict(
            "a user with this email already exists".into(),
        ));
    }

    let values = User::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_owned()),
        email: Set(normalize_email(email)),
        password_hash: Set(hash_password(password)?),
        role: Set(role),
        language: Set(None),
        interests: Set(serde_json::json!([])),
        profile_image_url: Set(None),
        created_at: Set(Utc::now()),
    };
    let user = values.insert(db).await?;
    info!(user = %user.id, role = %user.role, "User created");
    Ok(user)
}

/// Self-service sign-up. New accounts always start as USER.
pub async fn register(
    db: &DatabaseConnection,
    registration: Registration,
) -> Result<User::Model, HelpdeskError> {
    Validator::new()
        .min_len("name", &registration.name, 2)
        .email("email", &registration.email)
        .min_len("password", registration.password.expose_secret(), 6)
        .check(
            "confirm_password",
            registration.password == registration.confirm_password,
            "passwords do not match",
        )
        .finish()?;

    insert_user(
        db,
        &registration.name,
        &registration.email,
        &registration.password,
        UserRole::User,
    )
    .await
}

/// Creates a user with an arbitrary role, for bootstrapping from the command line.
pub async fn create_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &Secret<String>,
    role: UserRole,
) -> Result<User::Model, HelpdeskError> {
    Validator::new()
        .min_len("name", name, 2)
        .email("email", email)
        .min_len("password", password.expose_secret(), 6)
        .finish()?;

    insert_user(db, name, email, password, role).await
}

/// Returns `None` for an unknown email or a wrong password.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &Secret<String>,
) -> Result<Option<User::Model>, HelpdeskError> {
    let Some(user) = find_by_email(db, email).await? else {
        debug!("Login attempt for unknown email");
        return Ok(None);
    };
    if verify_password_hash(password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        debug!(user = %user.id, "Wrong password");
        Ok(None)
    }
}

/// Loads the current role for a session's user id. Roles are re-read on
/// every request so an approved upgrade applies without logging in again.
pub async fn resolve_identity(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Option<Identity>, HelpdeskError> {
    Ok(User::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .map(|user| Identity::new(user.id, user.role)))
}

pub async fn get_profile(
    db: &DatabaseConnection,
    identity: Option<&Identity>,
) -> Result<User::Model, HelpdeskError> {
    let identity = identity.ok_or(HelpdeskError::Unauthorized)?;
    User::Entity::find_by_id(identity.user_id)
        .one(db)
        .await?
        .ok_or(HelpdeskError::NotFound("user"))
}

pub async fn update_profile(
    db: &DatabaseConnection,
    identity: Option<&Identity>,
    update: ProfileUpdate,
) -> Result<User::Model, HelpdeskError> {
    let user = get_profile(db, identity).await?;

    let mut validator = Validator::new();
    if let Some(name) = &update.name {
        validator.min_len("name", name, 2);
    }
    if let Some(language) = &update.language {
        validator.min_len("language", language, 2);
    }
    if let Some(url) = &update.profile_image_url {
        validator.url("image", url);
    }
    validator.finish()?;

    let mut model: User::ActiveModel = user.into();
    if let Some(name) = update.name {
        model.name = Set(name.trim().to_owned());
    }
    if let Some(language) = update.language {
        model.language = Set(Some(language.trim().to_owned()));
    }
    if let Some(interests) = update.interests {
        let interests: Vec<String> = interests
            .into_iter()
            .map(|i| i.trim().to_owned())
            .filter(|i| !i.is_empty())
            .collect();
        model.interests = Set(serde_json::to_value(interests)?);
    }
    if let Some(url) = update.profile_image_url {
        model.profile_image_url = Set(Some(url));
    }
    Ok(model.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn registration(email: &str, password: &str, confirm: &str) -> Registration {
        Registration {
            name: "Alice".into(),
            email: email.into(),
            password: Secret::new(password.into()),
            confirm_password: Secret::new(confirm.into()),
        }
    }

    #[tokio::test]
    async fn test_register_and_authenticate() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let user = register(&db, registration("Alice@Example.com", "secret1", "secret1")).await?;
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.email, "alice@example.com");

        let password = Secret::new("secret1".to_owned());
        let found = authenticate(&db, "alice@example.com", &password).await?;
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let wrong = Secret::new("secret2".to_owned());
        assert!(authenticate(&db, "alice@example.com", &wrong).await?.is_none());
        assert!(authenticate(&db, "bob@example.com", &password).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_register_validation() {
        let db = test_db().await;
        let result = register(&db, registration("not-an-email", "123", "456")).await;
        let fields = match result {
            Err(HelpdeskError::Validation(fields)) => fields,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(fields.get("email").is_some());
        assert!(fields.get("password").is_some());
        assert_eq!(fields.get("confirm_password"), Some("passwords do not match"));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        make_user(&db, "alice", UserRole::User).await;
        let result = register(&db, registration("alice@example.com", "secret1", "secret1")).await;
        assert!(matches!(result, Err(HelpdeskError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let alice = make_user(&db, "alice", UserRole::User).await;

        let user = update_profile(
            &db,
            Some(&alice),
            ProfileUpdate {
                language: Some("de".into()),
                interests: Some(vec!["rust".into(), " ".into(), "networking".into()]),
                profile_image_url: Some("https://example.com/a.png".into()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(user.language.as_deref(), Some("de"));
        assert_eq!(user.interest_list(), vec!["rust", "networking"]);

        let result = update_profile(
            &db,
            Some(&alice),
            ProfileUpdate {
                profile_image_url: Some("ftp://example.com/a.png".into()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(HelpdeskError::Validation(_))));

        assert!(matches!(
            get_profile(&db, None).await,
            Err(HelpdeskError::Unauthorized)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_identity_reads_current_role() -> Result<(), HelpdeskError> {
        let db = test_db().await;
        let alice = make_user(&db, "alice", UserRole::SupportAgent).await;
        let identity = resolve_identity(&db, alice.user_id).await?;
        assert_eq!(identity, Some(alice));
        assert_eq!(resolve_identity(&db, Uuid::new_v4()).await?, None);
        Ok(())
    }
}
