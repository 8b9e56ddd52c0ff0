use poem_openapi::OpenApi;

pub mod auth;
pub mod categories;
pub mod profile;
pub mod tickets_detail;
pub mod tickets_list;
pub mod upgrade_requests;

pub fn get() -> impl OpenApi {
    (
        auth::Api,
        profile::Api,
        categories::Api,
        tickets_list::Api,
        tickets_detail::Api,
        upgrade_requests::Api,
    )
}
