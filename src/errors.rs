use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("slot taken: {0}")]
    SlotTaken(String),

    #[error(
        "cancellation requires {required_hours}h notice, only {hours_remaining:.2}h remaining"
    )]
    LeadTimeViolation {
        hours_remaining: f64,
        required_hours: i64,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::InvalidState(_) => "invalid_state",
            AppError::SlotTaken(_) => "slot_taken",
            AppError::LeadTimeViolation { .. } => "lead_time_violation",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

// Query helpers return anyhow; keep any AppError they carry intact.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(db) => AppError::Database(db),
                Err(err) => AppError::Internal(err),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::SlotTaken(_) => StatusCode::CONFLICT,
            AppError::LeadTimeViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = serde_json::json!({ "error": self.to_string(), "kind": self.kind() });
        if let AppError::LeadTimeViolation {
            hours_remaining,
            required_hours,
        } = &self
        {
            body["hours_remaining"] = serde_json::json!(hours_remaining);
            body["required_hours"] = serde_json::json!(required_hours);
        }
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_preserves_app_error() {
        let wrapped = anyhow::Error::new(AppError::SlotTaken("dog 5 at 09:00".to_string()));
        assert!(matches!(AppError::from(wrapped), AppError::SlotTaken(_)));
    }

    #[test]
    fn test_anyhow_other_becomes_internal() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn test_lead_time_message_reports_hours() {
        let err = AppError::LeadTimeViolation {
            hours_remaining: 11.5,
            required_hours: 12,
        };
        assert_eq!(
            err.to_string(),
            "cancellation requires 12h notice, only 11.50h remaining"
        );
    }
}
