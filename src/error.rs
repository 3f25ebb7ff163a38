use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HorizonError {
    #[error("Missing required parameters: {0}")]
    MissingParameter(String),

    #[error("Invalid {field}: {value}")]
    InvalidInstant { field: String, value: String },

    #[error("{message}")]
    InvalidRange { message: String },

    #[error("Invalid resolution: {0}. Must be one of: hour, day, week, month, year")]
    InvalidResolution(String),

    #[error("Resolution {resolution} is not available for preset {preset}")]
    ResolutionNotAllowed { resolution: String, preset: String },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    // Internal: a resolution reached a branch that does not handle it.
    #[error("Unsupported resolution: {0}")]
    UnsupportedResolution(String),
}

impl HorizonError {
    pub fn invalid_range(message: impl Into<String>) -> Self {
        HorizonError::InvalidRange {
            message: message.into(),
        }
    }

    pub fn invalid_instant(field: impl Into<String>, value: impl Into<String>) -> Self {
        HorizonError::InvalidInstant {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for every error caused by caller input. Only
    /// `UnsupportedResolution` indicates a defect in this crate.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, HorizonError::UnsupportedResolution(_))
    }
}

pub type HorizonResult<T> = Result<T, HorizonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_request_contract() {
        assert_eq!(
            HorizonError::MissingParameter("startDate, resolution".to_string()).to_string(),
            "Missing required parameters: startDate, resolution"
        );
        assert_eq!(
            HorizonError::invalid_instant("startDate", "yesterday").to_string(),
            "Invalid startDate: yesterday"
        );
        assert_eq!(
            HorizonError::invalid_range("startDate must be before endDate").to_string(),
            "startDate must be before endDate"
        );
        assert_eq!(
            HorizonError::UnknownPreset("2w".to_string()).to_string(),
            "Unknown preset: 2w"
        );
    }

    #[test]
    fn test_user_error_classification() {
        assert!(HorizonError::InvalidResolution("minute".to_string()).is_user_error());
        assert!(HorizonError::invalid_range("empty").is_user_error());
        assert!(!HorizonError::UnsupportedResolution("minute".to_string()).is_user_error());
    }
}
