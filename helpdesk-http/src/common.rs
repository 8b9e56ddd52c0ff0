use std::sync::Arc;

use helpdesk_common::{HelpdeskError, Identity};
use helpdesk_core::users::resolve_identity;
use helpdesk_core::Services;
use poem::error::ResponseError;
use poem::session::Session;
use poem::web::Data;
use poem::{Endpoint, EndpointExt, FromRequest, IntoResponse, Request, Response};
use poem_openapi::error::{ContentTypeError, ParseParamError, ParseRequestPayloadError};
use uuid::Uuid;

static USER_ID_SESSION_KEY: &str = "user_id";

pub trait SessionExt {
    fn get_user_id(&self) -> Option<Uuid>;
    fn set_user_id(&self, user_id: Uuid);
}

impl SessionExt for Session {
    fn get_user_id(&self) -> Option<Uuid> {
        self.get(USER_ID_SESSION_KEY)
    }

    fn set_user_id(&self, user_id: Uuid) {
        self.set(USER_ID_SESSION_KEY, user_id);
    }
}

/// The caller's identity, if the identity middleware resolved one.
pub fn identity(req: &Request) -> Option<&Identity> {
    req.data::<Identity>()
}

/// Resolves the session's user into an [Identity] and attaches it to the request.
/// Sessions pointing at a user that no longer exists are dropped.
pub(crate) async fn inject_identity<E: Endpoint + 'static>(
    ep: Arc<E>,
    req: Request,
) -> poem::Result<E::Output> {
    let session = <&Session>::from_request_without_body(&req).await?;
    let services = Data::<&Services>::from_request_without_body(&req).await?;

    let identity = match session.get_user_id() {
        Some(user_id) => {
            let identity = {
                let db = services.db.lock().await;
                resolve_identity(&db, user_id).await?
            };
            if identity.is_none() {
                session.purge();
            }
            identity
        }
        None => None,
    };

    if let Some(identity) = identity {
        // data_opt would change the return type from E::Output
        Ok(ep.data(identity).call(req).await?)
    } else {
        Ok(ep.call(req).await?)
    }
}

/// Renders request decoding failures as validation problems; other errors keep their own response.
pub(crate) fn render_error(error: poem::Error) -> Response {
    let problem = if let Some(e) = error.downcast_ref::<ParseParamError>() {
        HelpdeskError::validation(e.name, e.reason.clone())
    } else if let Some(e) = error.downcast_ref::<ParseRequestPayloadError>() {
        HelpdeskError::validation("body", e.reason.clone())
    } else if error.is::<ContentTypeError>() {
        HelpdeskError::validation("body", error.to_string())
    } else {
        return error.into_response();
    };
    problem.as_response()
}
