use std::net::ToSocketAddrs;
use std::time::Duration;

use crate::{ListenEndpoint, Secret, UserRole};

#[inline]
pub(crate) fn _default_database_url() -> Secret<String> {
    Secret::new("sqlite:data".to_owned())
}

#[inline]
pub(crate) fn _default_http_listen() -> ListenEndpoint {
    #[allow(clippy::unwrap_used)]
    ListenEndpoint("0.0.0.0:8080".to_socket_addrs().unwrap().next().unwrap())
}

#[inline]
pub(crate) fn _default_session_max_age() -> Duration {
    Duration::from_secs(60 * 60 * 24)
}

#[inline]
pub(crate) fn _default_cookie_name() -> String {
    "helpdesk-session".to_owned()
}

#[inline]
pub(crate) fn _default_staff_roles() -> Vec<UserRole> {
    vec![UserRole::SupportAgent]
}

#[inline]
pub(crate) fn _default_grant_role() -> UserRole {
    UserRole::SupportAgent
}

#[inline]
pub(crate) fn _default_categories() -> Vec<String> {
    vec![
        "General".to_owned(),
        "Billing".to_owned(),
        "Technical".to_owned(),
    ]
}
