use std::error::Error;

use poem::error::ResponseError;
use poem::http::StatusCode;
use poem::Response;
use serde::Serialize;
use tracing::error;

use crate::validation::FieldErrors;
use crate::TicketStatus;

/// Status class of a failure, mapped to an HTTP status by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    Internal,
}

impl ProblemKind {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HelpdeskError {
    #[error("authentication required")]
    Unauthorized,
    #[error("insufficient privileges")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },
    #[error("{0}")]
    InvalidState(String),
    #[error("database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    #[error("deserialization failed: {0}")]
    DeserializeJson(#[from] serde_json::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(password_hash::Error),
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl HelpdeskError {
    pub fn other<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Other(Box::new(err))
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        Self::Validation(errors)
    }

    pub fn kind(&self) -> ProblemKind {
        match self {
            Self::Unauthorized => ProblemKind::Unauthorized,
            Self::Forbidden => ProblemKind::Forbidden,
            Self::NotFound(_) => ProblemKind::NotFound,
            Self::Validation(_) => ProblemKind::Validation,
            Self::Conflict(_) | Self::InvalidTransition { .. } | Self::InvalidState(_) => {
                ProblemKind::Conflict
            }
            Self::DatabaseError(_)
            | Self::DeserializeJson(_)
            | Self::PasswordHash(_)
            | Self::Other(_)
            | Self::Anyhow(_) => ProblemKind::Internal,
        }
    }

    /// Structured body sent to the client. Internal causes are not exposed.
    pub fn problem(&self) -> Problem {
        let kind = self.kind();
        Problem {
            kind,
            message: match kind {
                ProblemKind::Internal => "Internal server error".to_owned(),
                _ => self.to_string(),
            },
            fields: match self {
                Self::Validation(fields) => Some(fields.clone()),
                _ => None,
            },
        }
    }
}

impl From<password_hash::Error> for HelpdeskError {
    fn from(err: password_hash::Error) -> Self {
        Self::PasswordHash(err)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub kind: ProblemKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ResponseError for HelpdeskError {
    fn status(&self) -> StatusCode {
        self.kind().status()
    }

    fn as_response(&self) -> Response {
        if self.kind() == ProblemKind::Internal {
            error!(error = %self, "Request failed");
        }
        let body = serde_json::to_string(&self.problem()).unwrap_or_default();
        Response::builder()
            .status(self.status())
            .content_type("application/json; charset=utf-8")
            .body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(HelpdeskError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(HelpdeskError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(HelpdeskError::NotFound("ticket").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            HelpdeskError::validation("text", "must not be empty").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HelpdeskError::Conflict("already pending".into()).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_invalid_transition_names_both_statuses() {
        let err = HelpdeskError::InvalidTransition {
            from: TicketStatus::Closed,
            to: TicketStatus::Open,
        };
        assert_eq!(err.kind(), ProblemKind::Conflict);
        assert_eq!(
            err.to_string(),
            "invalid status transition from CLOSED to OPEN"
        );
    }

    #[test]
    fn test_internal_problem_hides_cause() {
        let err = HelpdeskError::DatabaseError(sea_orm::DbErr::Custom("disk on fire".into()));
        let problem = err.problem();
        assert_eq!(problem.kind, ProblemKind::Internal);
        assert!(!problem.message.contains("disk"));
    }

    #[test]
    fn test_validation_problem_carries_fields() {
        let problem = HelpdeskError::validation("subject", "must be at least 5 characters")
            .problem();
        let json = serde_json::to_value(&problem).unwrap_or_default();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["fields"]["subject"], "must be at least 5 characters");
    }
}
