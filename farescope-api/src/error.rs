use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use farescope_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{context}: {source}")]
    UpstreamError {
        context: &'static str,
        #[source]
        source: CoreError,
    },
}

impl AppError {
    /// Wraps a domain error raised while doing `context`. Validation failures
    /// stay client errors; everything else is reported as an upstream failure.
    pub fn from_core(context: &'static str) -> impl FnOnce(CoreError) -> AppError {
        move |err| match err {
            CoreError::ValidationError { message, .. } => AppError::ValidationError(message),
            source => AppError::UpstreamError { context, source },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            AppError::UpstreamError { context, source } => {
                tracing::error!("{}: {}", context, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": context, "message": source.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
