use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

use crate::authz::types::DeniedFields;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    /// The actor's allow-mask is missing bits the request needs. Resubmitting
    /// the same request is denied again.
    #[error("Permission denied for {denied_fields}")]
    #[diagnostic(
        code(fieldgate::authz::permission_denied),
        help("Remove the denied fields from the request or obtain additional grants")
    )]
    PermissionDenied {
        denied_bits: Vec<u32>,
        denied_fields: DeniedFields,
    },

    #[error("Permission resolver failed: {0}")]
    #[diagnostic(code(fieldgate::authz::resolver))]
    Resolver(String),

    #[error("Invalid policy: {0}")]
    #[diagnostic(
        code(fieldgate::authz::invalid_policy),
        help("Relation policies must name a canonical field of the entity")
    )]
    InvalidPolicy(String),

    #[error("Invalid grant: {0}")]
    #[diagnostic(
        code(fieldgate::authz::invalid_grant),
        help("Grant syntax: [grants.<role>] <entity> = [\"<GROUP>\", ...] with entity one of game, developer, character")
    )]
    InvalidGrant(String),
}

impl AuthzError {
    /// Stable identifier for clients to translate.
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::PermissionDenied { .. } => "permission_denied",
            AuthzError::Resolver(_) => "resolver_unavailable",
            AuthzError::InvalidPolicy(_) => "invalid_policy",
            AuthzError::InvalidGrant(_) => "invalid_grant",
        }
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let body = match &self {
            AuthzError::PermissionDenied {
                denied_bits,
                denied_fields,
            } => json!({
                "error": self.code(),
                "message": self.to_string(),
                "args": {
                    "deniedBits": denied_bits,
                    "deniedFields": denied_fields,
                },
            }),
            _ => json!({ "error": self.code(), "message": self.to_string() }),
        };
        let status = match &self {
            AuthzError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            AuthzError::Resolver(_) => StatusCode::BAD_GATEWAY,
            AuthzError::InvalidPolicy(_) => StatusCode::BAD_REQUEST,
            AuthzError::InvalidGrant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(body)).into_response()
    }
}
