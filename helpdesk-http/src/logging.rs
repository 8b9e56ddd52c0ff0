use std::sync::Arc;

use poem::http::{Method, StatusCode, Uri};
use poem::{Endpoint, IntoResponse, Request, Response};
use tracing::*;

use crate::common::identity;

pub fn log_request_result(method: &Method, url: &Uri, client_ip: &str, status: &StatusCode) {
    if status.is_server_error() {
        error!(%method, %url, %status, %client_ip, "Request failed");
    } else if status.is_client_error() {
        warn!(%method, %url, %status, %client_ip, "Request failed");
    } else {
        info!(%method, %url, %status, %client_ip, "Request");
    }
}

pub fn get_client_ip(req: &Request) -> String {
    req.remote_addr()
        .as_socket_addr()
        .map(|x| x.ip().to_string())
        .unwrap_or("<unknown>".into())
}

pub(crate) async fn log_request<E: Endpoint + 'static>(
    ep: Arc<E>,
    req: Request,
) -> poem::Result<Response> {
    let method = req.method().clone();
    let url = req.original_uri().clone();
    let client_ip = get_client_ip(&req);
    let span = match identity(&req) {
        Some(identity) => info_span!("HTTP", user=%identity.user_id, role=%identity.role),
        None => info_span!("HTTP"),
    };

    let result = ep
        .call(req)
        .instrument(span)
        .await
        .map(IntoResponse::into_response);
    let status = match &result {
        Ok(response) => response.status(),
        Err(error) => error.status(),
    };
    log_request_result(&method, &url, &client_ip, &status);
    result
}
