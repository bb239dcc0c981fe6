use analyzer::AnalyzerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lifecycle::LifecycleError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("Order lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("Validation failed: {0}")]
    Validation(#[from] core_types::CoreError),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// `NotFound` -> 404, invalid transitions and lost races -> 409,
/// validation failures -> 400, everything else -> 500.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(db_err) => internal("Database error.", &db_err),
            AppError::Analyzer(AnalyzerError::Validation(e)) | AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Analyzer(analyzer_err) => internal("Analyzer error.", &analyzer_err),
            AppError::Lifecycle(LifecycleError::Database(db_err)) => internal("Database error.", &db_err),
            AppError::Lifecycle(e @ LifecycleError::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Lifecycle(e) => {
                tracing::warn!(error = %e, "Order transition refused.");
                (StatusCode::CONFLICT, e.to_string())
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

fn internal(context: &str, err: &dyn std::error::Error) -> (StatusCode, String) {
    tracing::error!(error = %err, "{}", context);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "An internal server error occurred".to_string(),
    )
}
