use helpdesk_common::UpgradeRequestStatus;
use helpdesk_core::upgrades::{
    approve_upgrade, list_upgrade_requests, request_upgrade, UpgradeRequestWithUser,
};
use helpdesk_core::Services;
use helpdesk_db_entities::UpgradeRequest;
use poem::web::Data;
use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, OpenApi};
use uuid::Uuid;

use crate::common::identity;

pub struct Api;

#[derive(ApiResponse)]
enum CreateUpgradeRequestResponse {
    #[oai(status = 201)]
    Created(Json<UpgradeRequest::Model>),
}

#[derive(ApiResponse)]
enum GetUpgradeRequestsResponse {
    #[oai(status = 200)]
    Ok(Json<Vec<UpgradeRequestWithUser>>),
}

#[derive(ApiResponse)]
enum ApproveUpgradeRequestResponse {
    #[oai(status = 200)]
    Ok(Json<UpgradeRequest::Model>),
}

#[OpenApi]
impl Api {
    #[oai(
        path = "/upgrade-requests",
        method = "post",
        operation_id = "create_upgrade_request"
    )]
    async fn api_create_upgrade_request(
        &self,
        req: &Request,
        services: Data<&Services>,
    ) -> poem::Result<CreateUpgradeRequestResponse> {
        let db = services.db.lock().await;
        let request = request_upgrade(&db, &services.policy, identity(req)).await?;
        Ok(CreateUpgradeRequestResponse::Created(Json(request)))
    }

    #[oai(
        path = "/upgrade-requests",
        method = "get",
        operation_id = "get_upgrade_requests"
    )]
    async fn api_get_upgrade_requests(
        &self,
        req: &Request,
        services: Data<&Services>,
        status: Query<Option<UpgradeRequestStatus>>,
    ) -> poem::Result<GetUpgradeRequestsResponse> {
        let db = services.db.lock().await;
        let requests =
            list_upgrade_requests(&db, &services.policy, identity(req), status.0).await?;
        Ok(GetUpgradeRequestsResponse::Ok(Json(requests)))
    }

    #[oai(
        path = "/upgrade-requests/:id/approve",
        method = "post",
        operation_id = "approve_upgrade_request"
    )]
    async fn api_approve_upgrade_request(
        &self,
        req: &Request,
        services: Data<&Services>,
        id: Path<Uuid>,
    ) -> poem::Result<ApproveUpgradeRequestResponse> {
        let grant_role = services.config.lock().await.store.upgrade.grant_role;
        let db = services.db.lock().await;
        let request =
            approve_upgrade(&db, &services.policy, identity(req), grant_role, id.0).await?;
        Ok(ApproveUpgradeRequestResponse::Ok(Json(request)))
    }
}
