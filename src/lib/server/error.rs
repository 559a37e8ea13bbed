use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

pub type Result<T> = actix_web::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl Error {
    /// Public message of the JSON envelope, details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Not found",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.public_message() }))
    }
}
