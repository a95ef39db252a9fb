use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KernelError>;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("{0} used before it was fitted")]
    NotFitted(&'static str),

    #[error("degenerate training data: {0}")]
    DegenerateTrainingData(String),

    #[error("training data is missing required column `{0}`")]
    MissingColumn(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KernelError {
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        KernelError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

impl ResponseError for KernelError {
    fn status_code(&self) -> StatusCode {
        match self {
            KernelError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            KernelError::InvalidInput { .. } => self.to_string(),
            other => {
                log::error!("prediction failed: {other}");
                "Prediction failed. Check server logs for details.".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": true,
            "message": message,
        }))
    }
}
