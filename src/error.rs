use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::websocket::ConnectionId;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    /// A connection id was registered twice. Fatal to the join attempt.
    #[error("duplicate connection: {0}")]
    DuplicateConnection(ConnectionId),

    /// The identity collaborator could not vouch for the caller.
    #[error("unauthorized")]
    Unauthorized,

    /// The chat directory rejected membership for the requested chat.
    #[error("not a member of chat {0}")]
    AuthorizationDenied(String),

    /// Inbound frame failed to parse or lacked required fields.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The storage service rejected or failed a persist call.
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal server error")]
    Internal,
}

impl From<tokio_postgres::Error> for AppError {
    fn from(e: tokio_postgres::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        AppError::Database(e.to_string())
    }
}

impl AppError {
    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::MalformedFrame(_) => 400,
            AppError::Unauthorized => 401,
            AppError::AuthorizationDenied(_) => 403,
            AppError::DuplicateConnection(_) => 409,
            AppError::Persistence(_) => 503,
            AppError::Config(_)
            | AppError::StartServer(_)
            | AppError::Database(_)
            | AppError::Internal => 500,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}
