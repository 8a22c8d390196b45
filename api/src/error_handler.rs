use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use connectors::ConnectorError;
use llm_service::LlmError;
use retrieval::RetrievalError;
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingEnv(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,     // startup-only
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            AppError::Http { status, .. } => *status,

            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Retrieval failures reach handlers through embedding or index calls;
/// both are upstream dependencies, so they map to 502.
impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        AppError::Http {
            status: StatusCode::BAD_GATEWAY,
            code: "RETRIEVAL_ERROR",
            message: err.to_string(),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Http {
            status: StatusCode::BAD_GATEWAY,
            code: "LLM_ERROR",
            message: err.to_string(),
        }
    }
}

impl From<ConnectorError> for AppError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::MissingVar(var) => AppError::Http {
                status: StatusCode::BAD_REQUEST,
                code: "CONNECTOR_NOT_CONFIGURED",
                message: format!("connector is not configured: {var} is unset"),
            },
            other => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "CONNECTOR_ERROR",
                message: other.to_string(),
            },
        }
    }
}
