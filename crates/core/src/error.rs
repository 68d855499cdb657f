use thiserror::Error;

pub type PulseResult<T> = Result<T, PulseError>;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Spreadsheet contains no data rows")]
    EmptyPayload,

    #[error("Payload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Not authorized: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PulseError {
    /// Stable machine-readable code used in API error bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            PulseError::Config(_) => "config_error",
            PulseError::Validation(_) => "validation_error",
            PulseError::UnsupportedMediaType(_) => "unsupported_media_type",
            PulseError::EmptyPayload => "empty_payload",
            PulseError::PayloadTooLarge { .. } => "payload_too_large",
            PulseError::InvalidDateFormat(_) => "invalid_date_format",
            PulseError::Spreadsheet(_) => "spreadsheet_error",
            PulseError::Unauthorized(_) => "unauthorized",
            PulseError::Forbidden(_) => "forbidden",
            PulseError::NotFound(_) => "not_found",
            PulseError::Store(_) => "store_error",
            PulseError::Serialization(_) => "serialization_error",
            PulseError::Internal(_) => "internal_error",
        }
    }

    /// True for failures the caller caused; everything else is a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PulseError::Validation(_)
                | PulseError::UnsupportedMediaType(_)
                | PulseError::EmptyPayload
                | PulseError::PayloadTooLarge { .. }
                | PulseError::Unauthorized(_)
                | PulseError::Forbidden(_)
                | PulseError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_classified() {
        assert!(PulseError::EmptyPayload.is_client_error());
        assert!(PulseError::Forbidden("admin only".into()).is_client_error());
        assert!(!PulseError::InvalidDateFormat("32-13-2024".into()).is_client_error());
        assert!(!PulseError::Store("connection reset".into()).is_client_error());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PulseError::EmptyPayload.code(), "empty_payload");
        assert_eq!(
            PulseError::PayloadTooLarge { limit: 10 }.code(),
            "payload_too_large"
        );
        assert_eq!(PulseError::NotFound("Campaign".into()).to_string(), "Campaign not found");
    }
}
