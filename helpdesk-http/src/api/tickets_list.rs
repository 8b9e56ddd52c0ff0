use helpdesk_common::TicketStatus;
use helpdesk_core::pagination::{PaginatedResponse, PaginationParams};
use helpdesk_core::tickets::{
    create_ticket, list_tickets, NewTicket, SortOrder, TicketQuery, TicketScope, TicketSort,
    TicketSummary,
};
use helpdesk_core::Services;
use helpdesk_db_entities::Ticket;
use poem::web::Data;
use poem::Request;
use poem_openapi::param::Query;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use crate::common::identity;

pub struct Api;

#[derive(ApiResponse)]
enum GetTicketsResponse {
    #[oai(status = 200)]
    Ok(Json<PaginatedResponse<TicketSummary>>),
}

#[derive(Object)]
struct TicketDataRequest {
    subject: String,
    description: String,
    category: String,
    attachment: Option<String>,
}

#[derive(ApiResponse)]
enum CreateTicketResponse {
    #[oai(status = 201)]
    Created(Json<Ticket::Model>),
}

#[OpenApi]
impl Api {
    #[allow(clippy::too_many_arguments)]
    #[oai(path = "/tickets", method = "get", operation_id = "get_tickets")]
    async fn api_get_all_tickets(
        &self,
        req: &Request,
        services: Data<&Services>,
        status: Query<Option<TicketStatus>>,
        category: Query<Option<String>>,
        search: Query<Option<String>>,
        sort: Query<Option<TicketSort>>,
        order: Query<Option<SortOrder>>,
        scope: Query<Option<TicketScope>>,
        page: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> poem::Result<GetTicketsResponse> {
        let query = TicketQuery {
            status: status.0,
            category: category.0.filter(|c| !c.is_empty()),
            search: search.0.filter(|s| !s.is_empty()),
            sort: sort.0.unwrap_or_default(),
            order: order.0.unwrap_or_default(),
            scope: scope.0.unwrap_or_default(),
            pagination: PaginationParams {
                page: page.0,
                limit: limit.0,
            },
        };

        let db = services.db.lock().await;
        let tickets = list_tickets(&db, identity(req), query).await?;
        Ok(GetTicketsResponse::Ok(Json(tickets)))
    }

    #[oai(path = "/tickets", method = "post", operation_id = "create_ticket")]
    async fn api_create_ticket(
        &self,
        req: &Request,
        services: Data<&Services>,
        body: Json<TicketDataRequest>,
    ) -> poem::Result<CreateTicketResponse> {
        let body = body.0;
        let db = services.db.lock().await;
        let ticket = create_ticket(
            &db,
            &services.policy,
            identity(req),
            NewTicket {
                subject: body.subject,
                description: body.description,
                category: body.category,
                attachment: body.attachment.filter(|a| !a.is_empty()),
            },
        )
        .await?;
        Ok(CreateTicketResponse::Created(Json(ticket)))
    }
}
