use poem_openapi::types::{ParseFromJSON, ToJSON};
use poem_openapi::Object;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, Select};

use crate::consts::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Object, Clone, Debug, PartialEq, Eq)]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Object)]
pub struct PaginatedResponse<T: ParseFromJSON + ToJSON + Send + Sync> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// 1-based page number and page size as requested by the client.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PaginationParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Runs `query` for one page and counts the full result set.
pub async fn fetch_page<E, M, C>(
    query: Select<E>,
    params: PaginationParams,
    db: &C,
) -> Result<(Vec<M>, PageMeta), DbErr>
where
    E: EntityTrait<Model = M>,
    C: ConnectionTrait,
    M: FromQueryResult + Sized + Send + Sync + 'static,
{
    let page = params.page();
    let limit = params.limit();

    let paginator = query.paginate(db, limit);
    let counts = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok((
        items,
        PageMeta {
            total: counts.number_of_items,
            page,
            limit,
            total_pages: counts.number_of_pages,
        },
    ))
}
