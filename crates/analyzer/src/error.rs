use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Invalid report request: {0}")]
    Validation(#[from] core_types::CoreError),

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("An internal calculation error occurred: {0}")]
    Calculation(#[from] analytics::AnalyticsError),
}
