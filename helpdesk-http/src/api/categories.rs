use helpdesk_core::categories::{create_category, list_categories};
use helpdesk_core::Services;
use helpdesk_db_entities::Category;
use poem::web::Data;
use poem::Request;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use crate::common::identity;

pub struct Api;

#[derive(Object)]
struct CategoryDataRequest {
    name: String,
}

#[derive(ApiResponse)]
enum GetCategoriesResponse {
    #[oai(status = 200)]
    Ok(Json<Vec<Category::Model>>),
}

#[derive(ApiResponse)]
enum CreateCategoryResponse {
    #[oai(status = 201)]
    Created(Json<Category::Model>),
}

#[OpenApi]
impl Api {
    #[oai(path = "/categories", method = "get", operation_id = "get_categories")]
    async fn api_get_categories(
        &self,
        services: Data<&Services>,
    ) -> poem::Result<GetCategoriesResponse> {
        let db = services.db.lock().await;
        Ok(GetCategoriesResponse::Ok(Json(list_categories(&db).await?)))
    }

    #[oai(path = "/categories", method = "post", operation_id = "create_category")]
    async fn api_create_category(
        &self,
        req: &Request,
        services: Data<&Services>,
        body: Json<CategoryDataRequest>,
    ) -> poem::Result<CreateCategoryResponse> {
        let db = services.db.lock().await;
        let category = create_category(&db, &services.policy, identity(req), &body.name).await?;
        Ok(CreateCategoryResponse::Created(Json(category)))
    }
}
