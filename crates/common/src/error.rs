use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Missing `data` field in request")]
    MissingData,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Attachment '{name}' exceeds the {limit} byte limit")]
    AttachmentTooLarge { name: String, limit: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Object already exists: {0}")]
    Conflict(String),
}

impl Error {
    /// Whether the caller sent something we refuse to store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSubmission(_)
                | Error::MissingData
                | Error::Json(_)
                | Error::AttachmentTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(Error::from(json).is_client_error());
        assert!(Error::MissingData.is_client_error());
        assert!(Error::InvalidSubmission("x".into()).is_client_error());
        assert!(Error::AttachmentTooLarge {
            name: "a.pdf".into(),
            limit: 1
        }
        .is_client_error());

        assert!(!Error::Configuration("x".into()).is_client_error());
        assert!(!Error::Storage("x".into()).is_client_error());
        assert!(!Error::Conflict("x".into()).is_client_error());
    }
}
