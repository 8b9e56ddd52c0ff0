use helpdesk_common::Secret;
use helpdesk_core::users::{authenticate, register, Registration};
use helpdesk_core::Services;
use poem::session::Session;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use tracing::*;

use super::profile::ProfileData;
use crate::common::SessionExt;

pub struct Api;

#[derive(Object)]
struct RegisterRequest {
    name: String,
    email: String,
    password: Secret<String>,
    confirm_password: Secret<String>,
}

#[derive(ApiResponse)]
enum RegisterResponse {
    #[oai(status = 201)]
    Created(Json<ProfileData>),
}

#[derive(Object)]
struct LoginRequest {
    email: String,
    password: Secret<String>,
}

#[derive(ApiResponse)]
enum LoginResponse {
    #[oai(status = 200)]
    Success(Json<ProfileData>),

    #[oai(status = 401)]
    Failure,
}

#[derive(ApiResponse)]
enum LogoutResponse {
    #[oai(status = 201)]
    Success,
}

#[OpenApi]
impl Api {
    #[oai(path = "/auth/register", method = "post", operation_id = "register")]
    async fn api_auth_register(
        &self,
        services: Data<&Services>,
        body: Json<RegisterRequest>,
    ) -> poem::Result<RegisterResponse> {
        let body = body.0;
        let db = services.db.lock().await;
        let user = register(
            &db,
            Registration {
                name: body.name,
                email: body.email,
                password: body.password,
                confirm_password: body.confirm_password,
            },
        )
        .await?;
        Ok(RegisterResponse::Created(Json(user.into())))
    }

    #[oai(path = "/auth/login", method = "post", operation_id = "login")]
    async fn api_auth_login(
        &self,
        session: &Session,
        services: Data<&Services>,
        body: Json<LoginRequest>,
    ) -> poem::Result<LoginResponse> {
        let db = services.db.lock().await;
        match authenticate(&db, &body.email, &body.password).await? {
            Some(user) => {
                session.renew();
                session.set_user_id(user.id);
                info!(user = %user.id, "User logged in");
                Ok(LoginResponse::Success(Json(user.into())))
            }
            None => Ok(LoginResponse::Failure),
        }
    }

    #[oai(path = "/auth/logout", method = "post", operation_id = "logout")]
    async fn api_auth_logout(&self, session: &Session) -> poem::Result<LogoutResponse> {
        session.purge();
        Ok(LogoutResponse::Success)
    }
}
