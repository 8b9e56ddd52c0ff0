pub mod api;
mod common;
mod logging;

use std::fmt::Debug;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use helpdesk_common::version::helpdesk_version;
use helpdesk_core::Services;
use poem::listener::TcpListener;
use poem::session::{CookieConfig, MemoryStorage, ServerSession};
use poem::{EndpointExt, Route, Server};
use poem_openapi::OpenApiService;
use tracing::*;

use crate::common::{inject_identity, render_error};
use crate::logging::log_request;

#[derive(Clone)]
pub struct HttpServer {
    services: Services,
}

impl HttpServer {
    pub fn new(services: &Services) -> Self {
        HttpServer {
            services: services.clone(),
        }
    }

    pub async fn run(self, address: SocketAddr) -> Result<()> {
        let api_service =
            OpenApiService::new(api::get(), "Helpdesk", helpdesk_version()).server("/api");
        let ui = api_service.stoplight_elements();
        let spec = api_service.spec_endpoint();

        let (cookie_name, session_max_age) = {
            let config = self.services.config.lock().await;
            (
                config.store.http.cookie_name.clone(),
                config.store.http.session_max_age,
            )
        };

        let app = Route::new()
            .nest("/api", api_service)
            .nest("/api/docs", ui)
            .at("/api/openapi.json", spec)
            .catch_all_error(|error| async move { render_error(error) })
            .around(log_request)
            .around(inject_identity)
            .with(ServerSession::new(
                CookieConfig::default()
                    .name(cookie_name)
                    .http_only(true)
                    .max_age(Some(session_max_age)),
                MemoryStorage::new(),
            ))
            .data(self.services.clone());

        info!(?address, "Listening");
        Server::new(TcpListener::bind(address))
            .run(app)
            .await
            .context("Failed to start HTTP server")
    }
}

impl Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HttpServer")
    }
}
