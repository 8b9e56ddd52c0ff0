use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserRole;

/// The authenticated caller of an operation.
///
/// Resolved once per request by the transport and passed explicitly into
/// every core operation; `None` stands for an anonymous caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Identity {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
