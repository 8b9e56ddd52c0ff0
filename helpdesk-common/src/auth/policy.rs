use std::collections::HashSet;

use uuid::Uuid;

use super::Identity;
use crate::{HelpdeskError, PolicyConfig, UserRole};

/// Something a caller wants to do. Ticket-scoped actions carry the ticket
/// owner where ownership matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    ViewTicket { owner_id: Uuid },
    Comment { owner_id: Uuid },
    Respond,
    TransitionStatus,
    Vote,
    CreateTicket,
    RequestUpgrade,
    ApproveUpgrade,
    ListUpgradeRequests,
    ManageCategories,
}

/// Decides whether an identity may perform an [Action].
///
/// "Staff" is the configured set of resolver-class roles. ADMIN is always
/// privileged and never needs to be listed.
#[derive(Clone, Debug)]
pub struct AccessPolicy {
    staff_roles: HashSet<UserRole>,
}

impl AccessPolicy {
    pub fn new(staff_roles: impl IntoIterator<Item = UserRole>) -> Self {
        Self {
            staff_roles: staff_roles
                .into_iter()
                .filter(|r| *r != UserRole::User)
                .collect(),
        }
    }

    pub fn is_privileged(&self, role: UserRole) -> bool {
        role == UserRole::Admin || self.staff_roles.contains(&role)
    }

    pub fn authorize<'a>(
        &self,
        identity: Option<&'a Identity>,
        action: Action,
    ) -> Result<&'a Identity, HelpdeskError> {
        let identity = identity.ok_or(HelpdeskError::Unauthorized)?;
        let allowed = match action {
            Action::ViewTicket { owner_id } | Action::Comment { owner_id } => {
                identity.user_id == owner_id || self.is_privileged(identity.role)
            }
            Action::Respond | Action::TransitionStatus => self.is_privileged(identity.role),
            Action::Vote | Action::CreateTicket | Action::RequestUpgrade => true,
            Action::ApproveUpgrade | Action::ListUpgradeRequests | Action::ManageCategories => {
                identity.is_admin()
            }
        };
        if allowed {
            Ok(identity)
        } else {
            Err(HelpdeskError::Forbidden)
        }
    }
}

impl From<&PolicyConfig> for AccessPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self::new(config.staff_roles.iter().copied())
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        (&PolicyConfig::default()).into()
    }
}
