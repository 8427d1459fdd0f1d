use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Envelope wrapping every backend response: `{success, message, data}`.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Shape of error bodies; `errors` carries per-field validation detail.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub errors: Option<serde_json::Value>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload. A successful envelope without `data` is a contract violation.
    pub fn into_data(self) -> AppResult<T> {
        self.data
            .ok_or_else(|| AppError::Envelope(format!("missing data in '{}'", self.message)))
    }
}
