use std::fmt::Display;

use poem_openapi::Enum;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "SUPPORT_AGENT")]
    SupportAgent,
    #[sea_orm(string_value = "QUERY_RESOLVER")]
    QueryResolver,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::SupportAgent => "SUPPORT_AGENT",
            Self::QueryResolver => "QUERY_RESOLVER",
            Self::Admin => "ADMIN",
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "SUPPORT_AGENT" => Ok(Self::SupportAgent),
            "QUERY_RESOLVER" => Ok(Self::QueryResolver),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Lifecycle state of a ticket.
///
/// ```text
/// OPEN        -> IN_PROGRESS | CLOSED
/// IN_PROGRESS -> RESOLVED    | CLOSED
/// RESOLVED    -> CLOSED
/// CLOSED      -> (terminal)
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

impl TicketStatus {
    pub fn allowed_transitions(&self) -> &'static [TicketStatus] {
        match self {
            Self::Open => &[Self::InProgress, Self::Closed],
            Self::InProgress => &[Self::Resolved, Self::Closed],
            Self::Resolved => &[Self::Closed],
            Self::Closed => &[],
        }
    }

    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }
}

impl Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distinguishes a follow-up from the ticket owner from a reply by staff.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentKind {
    #[sea_orm(string_value = "OWNER_COMMENT")]
    OwnerComment,
    #[sea_orm(string_value = "STAFF_RESPONSE")]
    StaffResponse,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeRequestStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VotePolarity {
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    #[test]
    fn test_transition_table() {
        use TicketStatus::*;
        let allowed = [
            (Open, InProgress),
            (Open, Closed),
            (InProgress, Resolved),
            (InProgress, Closed),
            (Resolved, Closed),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_closed_is_the_only_terminal_status() {
        let terminal: Vec<_> = ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![TicketStatus::Closed]);
    }

    #[test]
    fn test_no_self_transitions() {
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("support_agent".parse::<UserRole>(), Ok(UserRole::SupportAgent));
        assert_eq!("ADMIN".parse::<UserRole>(), Ok(UserRole::Admin));
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).ok().as_deref(),
            Some("\"IN_PROGRESS\"")
        );
    }
}
