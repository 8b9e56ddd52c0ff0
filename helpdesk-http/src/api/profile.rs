use chrono::{DateTime, Utc};
use helpdesk_common::UserRole;
use helpdesk_core::users::{get_profile, update_profile, ProfileUpdate};
use helpdesk_core::Services;
use helpdesk_db_entities::User;
use poem::web::Data;
use poem::Request;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use uuid::Uuid;

use crate::common::identity;

pub struct Api;

#[derive(Object)]
pub struct ProfileData {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub language: Option<String>,
    pub interests: Vec<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User::Model> for ProfileData {
    fn from(user: User::Model) -> Self {
        Self {
            interests: user.interest_list(),
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            language: user.language,
            image: user.profile_image_url,
            created_at: user.created_at,
        }
    }
}

#[derive(Object)]
struct ProfileDataRequest {
    name: Option<String>,
    language: Option<String>,
    interests: Option<Vec<String>>,
    image: Option<String>,
}

#[derive(ApiResponse)]
enum GetProfileResponse {
    #[oai(status = 200)]
    Ok(Json<ProfileData>),
}

#[derive(ApiResponse)]
enum UpdateProfileResponse {
    #[oai(status = 200)]
    Ok(Json<ProfileData>),
}

#[OpenApi]
impl Api {
    #[oai(path = "/profile", method = "get", operation_id = "get_profile")]
    async fn api_get_profile(
        &self,
        req: &Request,
        services: Data<&Services>,
    ) -> poem::Result<GetProfileResponse> {
        let db = services.db.lock().await;
        let user = get_profile(&db, identity(req)).await?;
        Ok(GetProfileResponse::Ok(Json(user.into())))
    }

    #[oai(path = "/profile", method = "put", operation_id = "update_profile")]
    async fn api_update_profile(
        &self,
        req: &Request,
        services: Data<&Services>,
        body: Json<ProfileDataRequest>,
    ) -> poem::Result<UpdateProfileResponse> {
        let body = body.0;
        let db = services.db.lock().await;
        let user = update_profile(
            &db,
            identity(req),
            ProfileUpdate {
                name: body.name,
                language: body.language,
                interests: body.interests,
                profile_image_url: body.image,
            },
        )
        .await?;
        Ok(UpdateProfileResponse::Ok(Json(user.into())))
    }
}
