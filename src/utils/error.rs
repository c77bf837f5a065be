use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Version conflict on {collection}/{id}")]
    Conflict { collection: String, id: String },

    #[error("Unexpected response status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Record in {collection} has no id")]
    MissingId { collection: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown record handle: {client_id}")]
    UnknownRecord { client_id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Status,
    Transport,
    Decode,
    Cancelled,
    Validation,
    Config,
}

impl AdapterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdapterError::NotFound { .. } => ErrorCategory::NotFound,
            AdapterError::Conflict { .. } => ErrorCategory::Conflict,
            AdapterError::Status { .. } => ErrorCategory::Status,
            AdapterError::Transport(_) => ErrorCategory::Transport,
            AdapterError::Decode(_) => ErrorCategory::Decode,
            AdapterError::Cancelled => ErrorCategory::Cancelled,
            AdapterError::MissingId { .. }
            | AdapterError::Validation { .. }
            | AdapterError::UnknownRecord { .. } => ErrorCategory::Validation,
            AdapterError::InvalidConfigValue { .. }
            | AdapterError::Config { .. }
            | AdapterError::Io(_) => ErrorCategory::Config,
        }
    }

    /// 給 CLI 使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::NotFound => format!("Nothing stored there: {}", self),
            ErrorCategory::Conflict => {
                "The document was changed by someone else, reload and try again".to_string()
            }
            ErrorCategory::Transport => {
                "Could not reach elasticsearch, is it running at the configured URL?".to_string()
            }
            ErrorCategory::Cancelled => "The request was cancelled".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let not_found = AdapterError::NotFound {
            collection: "people/person".to_string(),
            id: "foobar".to_string(),
        };
        assert_eq!(not_found.category(), ErrorCategory::NotFound);
        assert_eq!(
            not_found.to_string(),
            "Document not found: people/person/foobar"
        );

        let missing = AdapterError::MissingId {
            collection: "people/person".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Validation);

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(AdapterError::from(decode).category(), ErrorCategory::Decode);
    }

    #[test]
    fn test_user_friendly_message() {
        let err = AdapterError::Cancelled;
        assert_eq!(err.user_friendly_message(), "The request was cancelled");

        let err = AdapterError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(err.user_friendly_message().contains("500"));
    }
}
