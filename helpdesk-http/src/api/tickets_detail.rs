use helpdesk_common::{TicketStatus, VotePolarity};
use helpdesk_core::comments::{add_comment, CommentPath, CommentWithAuthor};
use helpdesk_core::lifecycle::transition;
use helpdesk_core::tickets::{get_ticket, TicketDetails};
use helpdesk_core::votes::{vote, VoteSummary};
use helpdesk_core::Services;
use helpdesk_db_entities::Ticket;
use poem::web::Data;
use poem::Request;
use poem_openapi::param::Path;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use uuid::Uuid;

use crate::common::identity;

pub struct Api;

#[derive(ApiResponse)]
enum GetTicketResponse {
    #[oai(status = 200)]
    Ok(Json<TicketDetails>),
}

#[derive(Object)]
struct CommentDataRequest {
    text: String,
}

#[derive(Object)]
struct ResponseDataRequest {
    message: String,
}

#[derive(ApiResponse)]
enum AddCommentResponse {
    #[oai(status = 201)]
    Created(Json<CommentWithAuthor>),
}

#[derive(Object)]
struct StatusChangeRequest {
    status: TicketStatus,
}

#[derive(ApiResponse)]
enum ChangeStatusResponse {
    #[oai(status = 200)]
    Ok(Json<Ticket::Model>),
}

#[derive(Object)]
struct VoteRequest {
    #[oai(rename = "type")]
    polarity: VotePolarity,
}

#[derive(ApiResponse)]
enum VoteResponse {
    #[oai(status = 200)]
    Ok(Json<VoteSummary>),
}

#[OpenApi]
impl Api {
    #[oai(path = "/tickets/:id", method = "get", operation_id = "get_ticket")]
    async fn api_get_ticket(
        &self,
        req: &Request,
        services: Data<&Services>,
        id: Path<Uuid>,
    ) -> poem::Result<GetTicketResponse> {
        let db = services.db.lock().await;
        let ticket = get_ticket(&db, &services.policy, identity(req), id.0).await?;
        Ok(GetTicketResponse::Ok(Json(ticket)))
    }

    #[oai(
        path = "/tickets/:id/comments",
        method = "post",
        operation_id = "add_ticket_comment"
    )]
    async fn api_add_comment(
        &self,
        req: &Request,
        services: Data<&Services>,
        id: Path<Uuid>,
        body: Json<CommentDataRequest>,
    ) -> poem::Result<AddCommentResponse> {
        let db = services.db.lock().await;
        let comment = add_comment(
            &db,
            &services.policy,
            identity(req),
            id.0,
            &body.text,
            CommentPath::Comment,
        )
        .await?;
        Ok(AddCommentResponse::Created(Json(comment)))
    }

    #[oai(
        path = "/tickets/:id/responses",
        method = "post",
        operation_id = "add_ticket_response"
    )]
    async fn api_add_response(
        &self,
        req: &Request,
        services: Data<&Services>,
        id: Path<Uuid>,
        body: Json<ResponseDataRequest>,
    ) -> poem::Result<AddCommentResponse> {
        let db = services.db.lock().await;
        let comment = add_comment(
            &db,
            &services.policy,
            identity(req),
            id.0,
            &body.message,
            CommentPath::Respond,
        )
        .await?;
        Ok(AddCommentResponse::Created(Json(comment)))
    }

    #[oai(
        path = "/tickets/:id/status",
        method = "patch",
        operation_id = "change_ticket_status"
    )]
    async fn api_change_status(
        &self,
        req: &Request,
        services: Data<&Services>,
        id: Path<Uuid>,
        body: Json<StatusChangeRequest>,
    ) -> poem::Result<ChangeStatusResponse> {
        let db = services.db.lock().await;
        let ticket = transition(&db, &services.policy, identity(req), id.0, body.status).await?;
        Ok(ChangeStatusResponse::Ok(Json(ticket)))
    }

    #[oai(path = "/tickets/:id/vote", method = "post", operation_id = "vote_ticket")]
    async fn api_vote(
        &self,
        req: &Request,
        services: Data<&Services>,
        id: Path<Uuid>,
        body: Json<VoteRequest>,
    ) -> poem::Result<VoteResponse> {
        let db = services.db.lock().await;
        let summary = vote(&db, &services.policy, identity(req), id.0, body.polarity).await?;
        Ok(VoteResponse::Ok(Json(summary)))
    }
}
