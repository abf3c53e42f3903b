use crate::store::StoreError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use async_graphql::ErrorExtensions;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store command failed: {0}")]
    StoreCommand(String),

    #[error("internal server error")]
    Internal,
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => AppError::StoreUnavailable(msg),
            StoreError::Command(msg) => AppError::StoreCommand(msg),
        }
    }
}

impl AppError {
    /// Stable machine-readable code, surfaced in GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG",
            AppError::StartServer(_) => "START_SERVER",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::StoreCommand(_) => "STORE_COMMAND",
            AppError::Internal => "INTERNAL",
        }
    }

    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::StoreUnavailable(_) => 503,
            _ => 500,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(AppError::status_code(self)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(ResponseError::status_code(self)).json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}
